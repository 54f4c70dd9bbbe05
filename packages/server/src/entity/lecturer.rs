use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A lecturer profile.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lecturer")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub full_name: String,
    /// e.g. "PhD", "MSc".
    pub academic_degree: Option<String>,
    /// e.g. "Associate Professor".
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

    /// Public media path or external URL of the portrait.
    pub image: Option<String>,

    #[sea_orm(has_many, via = "lecturer_keyword")]
    pub keywords: HasMany<super::keyword::Entity>,

    #[sea_orm(default_value = 0)]
    pub display_order: i32,
    pub is_active: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
