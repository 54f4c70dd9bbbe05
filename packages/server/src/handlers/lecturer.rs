use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::form::MutationForm;
use crate::extractors::json::AppJson;
use crate::models::keyword::KeywordIdsRequest;
use crate::models::lecturer::{LecturerForm, LecturerResponse, LecturerSearchQuery};
use crate::models::shared::RemovalResponse;
use crate::services::lecturer::{LecturerFilter, LecturerService};
use crate::state::AppState;

fn service(state: &AppState) -> LecturerService<'_> {
    LecturerService::new(&state.db, &*state.media)
}

#[instrument(skip(state, form), fields(has_image = form.media.is_some()))]
pub async fn create_lecturer(
    State(state): State<AppState>,
    form: MutationForm<LecturerForm>,
) -> Result<impl IntoResponse, AppError> {
    let profile = service(&state).create(form.fields, form.media).await?;
    Ok((StatusCode::CREATED, Json(LecturerResponse::from(profile))))
}

#[instrument(skip(state))]
pub async fn list_lecturers(
    State(state): State<AppState>,
) -> Result<Json<Vec<LecturerResponse>>, AppError> {
    let profiles = service(&state).list().await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn search_lecturers(
    State(state): State<AppState>,
    Query(query): Query<LecturerSearchQuery>,
) -> Result<Json<Vec<LecturerResponse>>, AppError> {
    let filter = LecturerFilter::try_from(query)?;
    let profiles = service(&state).search(filter).await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_lecturer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LecturerResponse>, AppError> {
    Ok(Json(service(&state).get(id).await?.into()))
}

#[instrument(skip(state, form), fields(has_image = form.media.is_some()))]
pub async fn update_lecturer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: MutationForm<LecturerForm>,
) -> Result<Json<LecturerResponse>, AppError> {
    let profile = service(&state).update(id, form.fields, form.media).await?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state))]
pub async fn delete_lecturer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemovalResponse>, AppError> {
    let removed = service(&state).remove(id).await?;
    Ok(Json(RemovalResponse {
        id: id.to_string(),
        warnings: removed.warnings,
    }))
}

#[instrument(skip(state, payload), fields(count = payload.keyword_ids.len()))]
pub async fn add_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<KeywordIdsRequest>,
) -> Result<Json<LecturerResponse>, AppError> {
    let profile = service(&state)
        .add_keywords(id, &payload.keyword_ids)
        .await?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state, payload), fields(count = payload.keyword_ids.len()))]
pub async fn remove_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<KeywordIdsRequest>,
) -> Result<Json<LecturerResponse>, AppError> {
    let profile = service(&state)
        .remove_keywords(id, &payload.keyword_ids)
        .await?;
    Ok(Json(profile.into()))
}
