use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::keyword;
use crate::error::{AppError, conflict_on_unique};
use crate::extractors::json::AppJson;
use crate::models::keyword::{CreateKeywordRequest, KeywordResponse};
use crate::models::shared::validate_name;
use crate::state::AppState;

#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_keyword(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateKeywordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim();
    validate_name(name, "name")?;

    let model = keyword::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, format!("Keyword '{name}' already exists")))?;

    Ok((StatusCode::CREATED, Json(KeywordResponse::from(model))))
}

#[instrument(skip(state))]
pub async fn list_keywords(
    State(state): State<AppState>,
) -> Result<Json<Vec<KeywordResponse>>, AppError> {
    let keywords = keyword::Entity::find()
        .order_by_asc(keyword::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(KeywordResponse::from)
        .collect();
    Ok(Json(keywords))
}
