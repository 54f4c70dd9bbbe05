use chrono::Utc;
use media::storage::{MediaInput, MediaStore};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{keyword, lecturer};
use crate::error::AppError;
use crate::lifecycle::{MediaLifecycle, release};
use crate::models::lecturer::{LecturerForm, validate_lecturer_form};
use crate::models::shared::non_blank;
use crate::relations::keyword::{
    KeywordResolver, clear_lecturer_keywords, lecturers_with_any_keyword, load_keywords_for,
    load_lecturer_keywords, save_lecturer_keywords,
};
use crate::relations::{AssociationSet, FieldUpdate};

use super::Removed;

/// A lecturer with its keywords in stored order.
#[derive(Debug, Clone)]
pub struct LecturerProfile {
    pub lecturer: lecturer::Model,
    pub keywords: Vec<keyword::Model>,
}

/// Criteria of a lecturer search.
#[derive(Debug, Clone, Default)]
pub struct LecturerFilter {
    pub search: Option<String>,
    pub keyword_ids: Vec<i32>,
}

/// Keyword set edits keyed by lecturer.
enum KeywordEdit<'a> {
    Add(&'a [i32]),
    Remove(&'a [i32]),
}

/// Creates, updates and removes lecturer profiles together with their
/// keyword set and portrait.
pub struct LecturerService<'a> {
    db: &'a DatabaseConnection,
    media: &'a dyn MediaStore,
}

impl<'a> LecturerService<'a> {
    pub fn new(db: &'a DatabaseConnection, media: &'a dyn MediaStore) -> Self {
        Self { db, media }
    }

    pub async fn create(
        &self,
        form: LecturerForm,
        image: Option<MediaInput>,
    ) -> Result<LecturerProfile, AppError> {
        validate_lecturer_form(&form, true)?;

        let now = Utc::now();
        let mut active = lecturer::ActiveModel {
            id: Set(Uuid::now_v7()),
            image: Set(None),
            display_order: Set(0),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let keyword_ids = apply_fields(&mut active, form);

        let mut lifecycle = MediaLifecycle::new(self.media);
        let outcome = self
            .insert_profile(&mut lifecycle, active, keyword_ids, image)
            .await;
        lifecycle.finish(outcome).await
    }

    async fn insert_profile(
        &self,
        lifecycle: &mut MediaLifecycle<'_>,
        mut active: lecturer::ActiveModel,
        keyword_ids: FieldUpdate<Vec<i32>>,
        image: Option<MediaInput>,
    ) -> Result<LecturerProfile, AppError> {
        let mut keywords = AssociationSet::new();
        keywords
            .replace(keyword_ids, &KeywordResolver::new(self.db))
            .await?;

        if let Some(image) = image {
            active.image = Set(Some(lifecycle.attach(image).await?));
        }

        let txn = self.db.begin().await?;
        let model = active.insert(&txn).await?;
        save_lecturer_keywords(&txn, model.id, &keywords).await?;
        txn.commit().await?;

        tracing::info!(lecturer_id = %model.id, keywords = keywords.len(), "Created lecturer");
        Ok(LecturerProfile {
            lecturer: model,
            keywords: keywords.into_members(),
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        form: LecturerForm,
        image: Option<MediaInput>,
    ) -> Result<LecturerProfile, AppError> {
        validate_lecturer_form(&form, false)?;

        let mut lifecycle = MediaLifecycle::new(self.media);
        let outcome = self.update_profile(&mut lifecycle, id, form, image).await;
        lifecycle.finish(outcome).await
    }

    async fn update_profile(
        &self,
        lifecycle: &mut MediaLifecycle<'_>,
        id: Uuid,
        form: LecturerForm,
        image: Option<MediaInput>,
    ) -> Result<LecturerProfile, AppError> {
        let existing = find_lecturer(self.db, id).await?;
        let current_image = existing.image.clone();
        let mut keywords = load_lecturer_keywords(self.db, id).await?;

        let mut active: lecturer::ActiveModel = existing.into();
        let keyword_ids = apply_fields(&mut active, form);

        // Keywords must resolve before the current portrait is touched.
        let keywords_changed = keywords
            .replace(keyword_ids, &KeywordResolver::new(self.db))
            .await?;

        if let Some(image) = image {
            let path = lifecycle.replace(current_image.as_deref(), image).await?;
            active.image = Set(Some(path));
        }

        active.updated_at = Set(Utc::now());
        let txn = self.db.begin().await?;
        let model = active.update(&txn).await?;
        if keywords_changed {
            save_lecturer_keywords(&txn, id, &keywords).await?;
        }
        txn.commit().await?;

        tracing::info!(lecturer_id = %id, keywords_changed, "Updated lecturer");
        Ok(LecturerProfile {
            lecturer: model,
            keywords: keywords.into_members(),
        })
    }

    /// Delete the row and its keyword links, then the portrait file.
    pub async fn remove(&self, id: Uuid) -> Result<Removed, AppError> {
        let txn = self.db.begin().await?;
        let existing = find_lecturer(&txn, id).await?;
        clear_lecturer_keywords(&txn, id).await?;
        lecturer::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(lecturer_id = %id, "Removed lecturer");
        let warnings = release(self.media, existing.image.as_deref())
            .await
            .into_iter()
            .collect();
        Ok(Removed { warnings })
    }

    /// Add keywords to the set. IDs already present keep their place.
    pub async fn add_keywords(&self, id: Uuid, ids: &[i32]) -> Result<LecturerProfile, AppError> {
        self.edit_keywords(id, KeywordEdit::Add(ids)).await
    }

    /// Remove keywords from the set. IDs not present are ignored.
    pub async fn remove_keywords(
        &self,
        id: Uuid,
        ids: &[i32],
    ) -> Result<LecturerProfile, AppError> {
        self.edit_keywords(id, KeywordEdit::Remove(ids)).await
    }

    async fn edit_keywords(
        &self,
        id: Uuid,
        edit: KeywordEdit<'_>,
    ) -> Result<LecturerProfile, AppError> {
        let txn = self.db.begin().await?;
        let lecturer = find_lecturer(&txn, id).await?;
        let mut keywords = load_lecturer_keywords(&txn, id).await?;

        match edit {
            KeywordEdit::Add(ids) => keywords.add(ids, &KeywordResolver::new(&txn)).await?,
            KeywordEdit::Remove(ids) => keywords.remove(ids),
        }

        save_lecturer_keywords(&txn, id, &keywords).await?;
        txn.commit().await?;

        Ok(LecturerProfile {
            lecturer,
            keywords: keywords.into_members(),
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<LecturerProfile, AppError> {
        let lecturer = find_lecturer(self.db, id).await?;
        let keywords = load_lecturer_keywords(self.db, id).await?.into_members();
        Ok(LecturerProfile { lecturer, keywords })
    }

    /// All lecturers by display order, newest first within the same order.
    pub async fn list(&self) -> Result<Vec<LecturerProfile>, AppError> {
        let lecturers = lecturer::Entity::find()
            .order_by_asc(lecturer::Column::DisplayOrder)
            .order_by_desc(lecturer::Column::CreatedAt)
            .all(self.db)
            .await?;
        self.with_keywords(lecturers).await
    }

    /// Active lecturers matching a name fragment and holding any of the
    /// given keywords. Empty criteria match everything active.
    pub async fn search(&self, filter: LecturerFilter) -> Result<Vec<LecturerProfile>, AppError> {
        let mut query = lecturer::Entity::find().filter(lecturer::Column::IsActive.eq(true));

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(lecturer::Column::FullName.contains(term));
        }

        if !filter.keyword_ids.is_empty() {
            let ids = lecturers_with_any_keyword(self.db, &filter.keyword_ids).await?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(lecturer::Column::Id.is_in(ids));
        }

        let lecturers = query
            .order_by_asc(lecturer::Column::DisplayOrder)
            .order_by_desc(lecturer::Column::CreatedAt)
            .all(self.db)
            .await?;
        self.with_keywords(lecturers).await
    }

    async fn with_keywords(
        &self,
        lecturers: Vec<lecturer::Model>,
    ) -> Result<Vec<LecturerProfile>, AppError> {
        let ids: Vec<Uuid> = lecturers.iter().map(|l| l.id).collect();
        let mut keywords = load_keywords_for(self.db, &ids).await?;

        Ok(lecturers
            .into_iter()
            .map(|lecturer| LecturerProfile {
                keywords: keywords.remove(&lecturer.id).unwrap_or_default(),
                lecturer,
            })
            .collect())
    }
}

/// Assign the provided plain fields and hand back the keyword request.
fn apply_fields(active: &mut lecturer::ActiveModel, form: LecturerForm) -> FieldUpdate<Vec<i32>> {
    if let FieldUpdate::Provided(name) = form.full_name {
        active.full_name = Set(name.trim().to_string());
    }

    assign_text(&mut active.academic_degree, form.academic_degree);
    assign_text(&mut active.academic_rank, form.academic_rank);
    assign_text(&mut active.work_unit, form.work_unit);
    assign_text(&mut active.position, form.position);
    assign_text(&mut active.teaching_field, form.teaching_field);
    assign_text(&mut active.research_field, form.research_field);
    assign_text(&mut active.email, form.email);
    assign_text(&mut active.phone, form.phone);
    assign_text(&mut active.zalo, form.zalo);
    assign_text(&mut active.message, form.message);
    assign_text(&mut active.website, form.website);
    assign_text(&mut active.bio, form.bio);

    if let FieldUpdate::Provided(year) = form.birth_year {
        active.birth_year = Set(year);
    }
    if let FieldUpdate::Provided(order) = form.display_order {
        active.display_order = Set(order);
    }
    if let FieldUpdate::Provided(is_active) = form.is_active {
        active.is_active = Set(is_active);
    }

    form.keyword_ids
}

fn assign_text(field: &mut ActiveValue<Option<String>>, update: FieldUpdate<Option<String>>) {
    if let FieldUpdate::Provided(value) = update {
        *field = Set(non_blank(value));
    }
}

async fn find_lecturer<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<lecturer::Model, AppError> {
    lecturer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lecturer not found".into()))
}
