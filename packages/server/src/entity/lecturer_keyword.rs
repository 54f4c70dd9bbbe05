use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lecturer_keyword")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub lecturer_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub keyword_id: i32,
    #[sea_orm(belongs_to, from = "lecturer_id", to = "id")]
    pub lecturer: Option<super::lecturer::Entity>,
    #[sea_orm(belongs_to, from = "keyword_id", to = "id")]
    pub keyword: Option<super::keyword::Entity>,

    /// Order of the keyword within the lecturer's set.
    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
