use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::form::MutationForm;
use crate::models::post::{PostForm, PostResponse};
use crate::models::shared::RemovalResponse;
use crate::services::post::PostService;
use crate::state::AppState;

fn service(state: &AppState) -> PostService<'_> {
    PostService::new(&state.db, &*state.media)
}

#[instrument(skip(state, form), fields(has_image = form.media.is_some()))]
pub async fn create_post(
    State(state): State<AppState>,
    form: MutationForm<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let view = service(&state).create(form.fields, form.media).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(view))))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostResponse>>, AppError> {
    let views = service(&state).list().await?;
    Ok(Json(views.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    Ok(Json(service(&state).get(id).await?.into()))
}

#[instrument(skip(state, form), fields(has_image = form.media.is_some()))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: MutationForm<PostForm>,
) -> Result<Json<PostResponse>, AppError> {
    let view = service(&state).update(id, form.fields, form.media).await?;
    Ok(Json(view.into()))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RemovalResponse>, AppError> {
    let removed = service(&state).remove(id).await?;
    Ok(Json(RemovalResponse {
        id: id.to_string(),
        warnings: removed.warnings,
    }))
}
