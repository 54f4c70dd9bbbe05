use chrono::{DateTime, Utc};
use media::storage::MediaInput;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::form::{FormFields, boolean, nullable_number, nullable_text};
use crate::relations::FieldUpdate;
use crate::services::post::PostView;

use super::category::CategoryResponse;
use super::shared::validate_name;

/// Fields of a post create or update. Same omission rules as lecturers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: FieldUpdate<String>,
    pub description: FieldUpdate<Option<String>>,
    pub contents: FieldUpdate<String>,
    pub category_id: FieldUpdate<Option<i32>>,
    pub is_active: FieldUpdate<bool>,
    /// Cover image as a `data:image/<ext>;base64,...` string.
    pub image_base64: Option<String>,
}

impl FormFields for PostForm {
    fn set_field(&mut self, name: &str, value: String) -> Result<(), AppError> {
        match name {
            "title" => self.title = FieldUpdate::Provided(value),
            "description" => self.description = nullable_text(value),
            "contents" => self.contents = FieldUpdate::Provided(value),
            "category_id" => self.category_id = nullable_number(name, &value)?,
            "is_active" => self.is_active = boolean(name, &value)?,
            "image_base64" => self.image_base64 = Some(value),
            _ => {}
        }
        Ok(())
    }

    fn take_inline_media(&mut self) -> Option<MediaInput> {
        self.image_base64
            .take()
            .filter(|s| !s.trim().is_empty())
            .map(MediaInput::DataUri)
    }
}

pub fn validate_post_form(form: &PostForm, creating: bool) -> Result<(), AppError> {
    match &form.title {
        FieldUpdate::Provided(title) => validate_name(title, "title")?,
        FieldUpdate::NotProvided if creating => {
            return Err(AppError::Validation("title is required".into()));
        }
        FieldUpdate::NotProvided => {}
    }
    if let FieldUpdate::Provided(contents) = &form.contents
        && contents.len() > 1_000_000
    {
        return Err(AppError::Validation(
            "contents must be at most 1MB".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub contents: String,
    pub image: Option<String>,
    pub category_id: Option<i32>,
    pub category: Option<CategoryResponse>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        let m = view.post;
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            contents: m.contents,
            image: m.image,
            category_id: m.category_id,
            category: view.category.map(CategoryResponse::from),
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
