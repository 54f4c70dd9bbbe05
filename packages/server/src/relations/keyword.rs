//! Lecturer → keyword association, stored in `lecturer_keyword`.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::*;
use uuid::Uuid;

use super::{Associated, AssociationSet, TargetResolver};
use crate::entity::{keyword, lecturer_keyword};

impl Associated for keyword::Model {
    type Id = i32;

    fn target_id(&self) -> i32 {
        self.id
    }
}

/// Resolves keyword IDs against the database.
pub struct KeywordResolver<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> KeywordResolver<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<C> TargetResolver for KeywordResolver<'_, C>
where
    C: ConnectionTrait + Send + Sync,
{
    type Target = keyword::Model;

    fn target_name(&self) -> &'static str {
        "Keyword"
    }

    async fn resolve(&self, ids: &[i32]) -> Result<Vec<keyword::Model>, DbErr> {
        keyword::Entity::find()
            .filter(keyword::Column::Id.is_in(ids.to_vec()))
            .all(self.db)
            .await
    }
}

/// Load a lecturer's keywords in stored order.
pub async fn load_lecturer_keywords<C: ConnectionTrait>(
    db: &C,
    lecturer_id: Uuid,
) -> Result<AssociationSet<keyword::Model>, DbErr> {
    let mut by_lecturer = load_keywords_for(db, &[lecturer_id]).await?;
    Ok(AssociationSet::from_members(
        by_lecturer.remove(&lecturer_id).unwrap_or_default(),
    ))
}

/// Load the keywords of several lecturers with two queries.
pub async fn load_keywords_for<C: ConnectionTrait>(
    db: &C,
    lecturer_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<keyword::Model>>, DbErr> {
    if lecturer_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = lecturer_keyword::Entity::find()
        .filter(lecturer_keyword::Column::LecturerId.is_in(lecturer_ids.to_vec()))
        .order_by_asc(lecturer_keyword::Column::Position)
        .all(db)
        .await?;

    let mut keyword_ids: Vec<i32> = links.iter().map(|l| l.keyword_id).collect();
    keyword_ids.sort_unstable();
    keyword_ids.dedup();

    let keywords: HashMap<i32, keyword::Model> = keyword::Entity::find()
        .filter(keyword::Column::Id.is_in(keyword_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|k| (k.id, k))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<keyword::Model>> = HashMap::new();
    for link in links {
        if let Some(k) = keywords.get(&link.keyword_id) {
            grouped.entry(link.lecturer_id).or_default().push(k.clone());
        }
    }
    Ok(grouped)
}

/// IDs of lecturers linked to at least one of `keyword_ids`.
pub async fn lecturers_with_any_keyword<C: ConnectionTrait>(
    db: &C,
    keyword_ids: &[i32],
) -> Result<Vec<Uuid>, DbErr> {
    let mut ids: Vec<Uuid> = lecturer_keyword::Entity::find()
        .filter(lecturer_keyword::Column::KeywordId.is_in(keyword_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.lecturer_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Persist a finished keyword set, replacing whatever was stored.
pub async fn save_lecturer_keywords<C: ConnectionTrait>(
    db: &C,
    lecturer_id: Uuid,
    set: &AssociationSet<keyword::Model>,
) -> Result<(), DbErr> {
    clear_lecturer_keywords(db, lecturer_id).await?;
    if set.is_empty() {
        return Ok(());
    }

    let links = set
        .ids()
        .into_iter()
        .enumerate()
        .map(|(position, keyword_id)| lecturer_keyword::ActiveModel {
            lecturer_id: Set(lecturer_id),
            keyword_id: Set(keyword_id),
            position: Set(position as i32),
        });
    lecturer_keyword::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Drop every keyword link of a lecturer.
pub async fn clear_lecturer_keywords<C: ConnectionTrait>(
    db: &C,
    lecturer_id: Uuid,
) -> Result<(), DbErr> {
    lecturer_keyword::Entity::delete_many()
        .filter(lecturer_keyword::Column::LecturerId.eq(lecturer_id))
        .exec(db)
        .await?;
    Ok(())
}
