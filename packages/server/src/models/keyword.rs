use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::keyword;

#[derive(Deserialize)]
pub struct CreateKeywordRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct KeywordResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<keyword::Model> for KeywordResponse {
    fn from(m: keyword::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

/// Body of the add/remove keyword endpoints.
#[derive(Debug, Deserialize)]
pub struct KeywordIdsRequest {
    pub keyword_ids: Vec<i32>,
}
