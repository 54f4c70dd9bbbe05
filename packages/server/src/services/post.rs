use chrono::Utc;
use media::storage::{MediaInput, MediaStore};
use sea_orm::*;

use crate::entity::{category, post};
use crate::error::AppError;
use crate::lifecycle::{MediaLifecycle, release};
use crate::models::post::{PostForm, validate_post_form};
use crate::models::shared::non_blank;
use crate::relations::FieldUpdate;

use super::Removed;

/// A post with its category as currently stored.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: post::Model,
    pub category: Option<category::Model>,
}

/// Creates, updates and removes blog posts together with their cover image.
pub struct PostService<'a> {
    db: &'a DatabaseConnection,
    media: &'a dyn MediaStore,
}

impl<'a> PostService<'a> {
    pub fn new(db: &'a DatabaseConnection, media: &'a dyn MediaStore) -> Self {
        Self { db, media }
    }

    pub async fn create(
        &self,
        form: PostForm,
        image: Option<MediaInput>,
    ) -> Result<PostView, AppError> {
        validate_post_form(&form, true)?;

        let now = Utc::now();
        let mut active = post::ActiveModel {
            contents: Set(String::new()),
            image: Set(None),
            category_id: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_fields(&mut active, form);

        let mut lifecycle = MediaLifecycle::new(self.media);
        let outcome = self.insert_post(&mut lifecycle, active, image).await;
        lifecycle.finish(outcome).await
    }

    async fn insert_post(
        &self,
        lifecycle: &mut MediaLifecycle<'_>,
        mut active: post::ActiveModel,
        image: Option<MediaInput>,
    ) -> Result<PostView, AppError> {
        let category = match &active.category_id {
            ActiveValue::Set(Some(cid)) => Some(find_category(self.db, *cid).await?),
            _ => None,
        };

        if let Some(image) = image {
            active.image = Set(Some(lifecycle.attach(image).await?));
        }

        let model = active.insert(self.db).await?;
        tracing::info!(post_id = model.id, "Created post");
        Ok(PostView {
            post: model,
            category,
        })
    }

    pub async fn update(
        &self,
        id: i32,
        form: PostForm,
        image: Option<MediaInput>,
    ) -> Result<PostView, AppError> {
        validate_post_form(&form, false)?;

        let mut lifecycle = MediaLifecycle::new(self.media);
        let outcome = self.update_post(&mut lifecycle, id, form, image).await;
        lifecycle.finish(outcome).await
    }

    async fn update_post(
        &self,
        lifecycle: &mut MediaLifecycle<'_>,
        id: i32,
        form: PostForm,
        image: Option<MediaInput>,
    ) -> Result<PostView, AppError> {
        let existing = find_post(self.db, id).await?;
        let previous_category_id = existing.category_id;
        let mut category = match previous_category_id {
            Some(cid) => category::Entity::find_by_id(cid).one(self.db).await?,
            None => None,
        };
        let current_image = existing.image.clone();

        let mut active: post::ActiveModel = existing.into();
        apply_fields(&mut active, form);
        if let ActiveValue::Set(Some(cid)) = &active.category_id
            && Some(*cid) != previous_category_id
        {
            find_category(self.db, *cid).await?;
        }

        if let Some(image) = image {
            let path = lifecycle.replace(current_image.as_deref(), image).await?;
            active.image = Set(Some(path));
        }

        active.updated_at = Set(Utc::now());
        let model = active.update(self.db).await?;

        // The loaded category belongs to the old key; never reuse it for a new one.
        if model.category_id != previous_category_id {
            category = match model.category_id {
                Some(cid) => category::Entity::find_by_id(cid).one(self.db).await?,
                None => None,
            };
        }

        tracing::info!(post_id = id, "Updated post");
        Ok(PostView {
            post: model,
            category,
        })
    }

    /// Delete the row, then the cover image file.
    pub async fn remove(&self, id: i32) -> Result<Removed, AppError> {
        let existing = find_post(self.db, id).await?;
        post::Entity::delete_by_id(id).exec(self.db).await?;

        tracing::info!(post_id = id, "Removed post");
        let warnings = release(self.media, existing.image.as_deref())
            .await
            .into_iter()
            .collect();
        Ok(Removed { warnings })
    }

    pub async fn get(&self, id: i32) -> Result<PostView, AppError> {
        let post = find_post(self.db, id).await?;
        let category = match post.category_id {
            Some(cid) => category::Entity::find_by_id(cid).one(self.db).await?,
            None => None,
        };
        Ok(PostView { post, category })
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<PostView>, AppError> {
        let posts = post::Entity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(self.db)
            .await?;

        let mut category_ids: Vec<i32> = posts.iter().filter_map(|p| p.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let categories: std::collections::HashMap<i32, category::Model> = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                category: post.category_id.and_then(|cid| categories.get(&cid).cloned()),
                post,
            })
            .collect())
    }
}

fn apply_fields(active: &mut post::ActiveModel, form: PostForm) {
    if let FieldUpdate::Provided(title) = form.title {
        active.title = Set(title.trim().to_string());
    }
    if let FieldUpdate::Provided(description) = form.description {
        active.description = Set(non_blank(description));
    }
    if let FieldUpdate::Provided(contents) = form.contents {
        active.contents = Set(contents);
    }
    if let FieldUpdate::Provided(category_id) = form.category_id {
        active.category_id = Set(category_id);
    }
    if let FieldUpdate::Provided(is_active) = form.is_active {
        active.is_active = Set(is_active);
    }
}

async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<post::Model, AppError> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))
}
