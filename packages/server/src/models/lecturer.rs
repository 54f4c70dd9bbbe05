use chrono::{DateTime, Datelike, Utc};
use media::storage::MediaInput;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::form::{FormFields, boolean, id_list, nullable_number, nullable_text, number};
use crate::relations::FieldUpdate;
use crate::services::lecturer::{LecturerFilter, LecturerProfile};

use super::keyword::KeywordResponse;
use super::shared::validate_name;

/// Fields of a lecturer create or update.
///
/// For updates every field is optional: absent leaves the column unchanged,
/// and for nullable text columns an empty string (or JSON `null`) clears it.
/// `keyword_ids` follows the same rule: absent is untouched, `[]` clears.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LecturerForm {
    pub full_name: FieldUpdate<String>,
    pub academic_degree: FieldUpdate<Option<String>>,
    pub academic_rank: FieldUpdate<Option<String>>,
    pub birth_year: FieldUpdate<Option<i32>>,
    pub work_unit: FieldUpdate<Option<String>>,
    pub position: FieldUpdate<Option<String>>,
    pub teaching_field: FieldUpdate<Option<String>>,
    pub research_field: FieldUpdate<Option<String>>,
    pub email: FieldUpdate<Option<String>>,
    pub phone: FieldUpdate<Option<String>>,
    pub zalo: FieldUpdate<Option<String>>,
    pub message: FieldUpdate<Option<String>>,
    pub website: FieldUpdate<Option<String>>,
    pub bio: FieldUpdate<Option<String>>,
    pub display_order: FieldUpdate<i32>,
    pub is_active: FieldUpdate<bool>,
    pub keyword_ids: FieldUpdate<Vec<i32>>,
    /// Portrait as a `data:image/<ext>;base64,...` string.
    pub image_base64: Option<String>,
}

impl FormFields for LecturerForm {
    fn set_field(&mut self, name: &str, value: String) -> Result<(), AppError> {
        match name {
            "full_name" => self.full_name = FieldUpdate::Provided(value),
            "academic_degree" => self.academic_degree = nullable_text(value),
            "academic_rank" => self.academic_rank = nullable_text(value),
            "birth_year" => self.birth_year = nullable_number(name, &value)?,
            "work_unit" => self.work_unit = nullable_text(value),
            "position" => self.position = nullable_text(value),
            "teaching_field" => self.teaching_field = nullable_text(value),
            "research_field" => self.research_field = nullable_text(value),
            "email" => self.email = nullable_text(value),
            "phone" => self.phone = nullable_text(value),
            "zalo" => self.zalo = nullable_text(value),
            "message" => self.message = nullable_text(value),
            "website" => self.website = nullable_text(value),
            "bio" => self.bio = nullable_text(value),
            "display_order" => self.display_order = number(name, &value)?,
            "is_active" => self.is_active = boolean(name, &value)?,
            "keyword_ids" => self.keyword_ids = id_list(name, &value)?,
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

pub fn validate_lecturer_form(form: &LecturerForm, creating: bool) -> Result<(), AppError> {
    match &form.full_name {
        FieldUpdate::Provided(name) => validate_name(name, "full_name")?,
        FieldUpdate::NotProvided if creating => {
            return Err(AppError::Validation("full_name is required".into()));
        }
        FieldUpdate::NotProvided => {}
    }

    if let FieldUpdate::Provided(Some(year)) = form.birth_year {
        let current = Utc::now().year();
        if !(1900..=current).contains(&year) {
            return Err(AppError::Validation(format!(
                "birth_year must be between 1900 and {current}"
            )));
        }
    }

    if let FieldUpdate::Provided(Some(email)) = &form.email
        && !email.trim().is_empty()
        && !email.contains('@')
    {
        return Err(AppError::Validation("email must be a valid address".into()));
    }

    if let FieldUpdate::Provided(order) = form.display_order
        && order < 0
    {
        return Err(AppError::Validation("display_order must be >= 0".into()));
    }
    Ok(())
}

/// Query string of `GET /lecturers/search`.
///
/// `keyword_ids` is a comma-separated list, e.g. `?keyword_ids=3,7`.
#[derive(Debug, Default, Deserialize)]
pub struct LecturerSearchQuery {
    pub search: Option<String>,
    pub keyword_ids: Option<String>,
}

impl TryFrom<LecturerSearchQuery> for LecturerFilter {
    type Error = AppError;

    fn try_from(query: LecturerSearchQuery) -> Result<Self, AppError> {
        let keyword_ids = match query.keyword_ids.as_deref() {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<i32>().map_err(|_| {
                        AppError::Validation(format!("'keyword_ids' has a non-numeric ID: {part}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(LecturerFilter {
            search: query.search,
            keyword_ids,
        })
    }
}

#[derive(Serialize)]
pub struct LecturerResponse {
    pub id: Uuid,
    pub full_name: String,
    pub academic_degree: Option<String>,
    pub academic_rank: Option<String>,
    pub birth_year: Option<i32>,
    pub work_unit: Option<String>,
    pub position: Option<String>,
    pub teaching_field: Option<String>,
    pub research_field: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub zalo: Option<String>,
    pub message: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub keywords: Vec<KeywordResponse>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LecturerProfile> for LecturerResponse {
    fn from(profile: LecturerProfile) -> Self {
        let m = profile.lecturer;
        Self {
            id: m.id,
            full_name: m.full_name,
            academic_degree: m.academic_degree,
            academic_rank: m.academic_rank,
            birth_year: m.birth_year,
            work_unit: m.work_unit,
            position: m.position,
            teaching_field: m.teaching_field,
            research_field: m.research_field,
            email: m.email,
            phone: m.phone,
            zalo: m.zalo,
            message: m.message,
            website: m.website,
            bio: m.bio,
            image: m.image,
            keywords: profile
                .keywords
                .into_iter()
                .map(KeywordResponse::from)
                .collect(),
            display_order: m.display_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
