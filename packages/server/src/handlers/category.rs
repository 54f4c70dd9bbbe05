use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::category;
use crate::error::{AppError, conflict_on_unique};
use crate::extractors::json::AppJson;
use crate::models::category::{CategoryResponse, CreateCategoryRequest};
use crate::models::shared::{non_blank, validate_name};
use crate::state::AppState;

#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim().to_string();
    validate_name(&name, "name")?;

    let now = Utc::now();
    let model = category::ActiveModel {
        name: Set(name.clone()),
        description: Set(non_blank(payload.description)),
        slug: Set(non_blank(payload.slug)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, format!("Category '{name}' already exists")))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(categories))
}
