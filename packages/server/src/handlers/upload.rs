use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::form::UploadBatch;
use crate::extractors::json::AppJson;
use crate::models::upload::{
    Base64UploadRequest, DeleteMediaRequest, DeleteMediaResponse, UploadResponse,
};
use crate::state::AppState;

/// Store every `files` part of a multipart request, all or nothing.
#[instrument(skip(state, batch), fields(count = batch.0.len()))]
pub async fn upload_files(
    State(state): State<AppState>,
    batch: UploadBatch,
) -> Result<impl IntoResponse, AppError> {
    let files = state.media.store_batch(batch.0).await?;
    tracing::info!(count = files.len(), "Stored uploaded files");
    Ok((StatusCode::CREATED, Json(UploadResponse { files })))
}

#[instrument(skip(state, payload), fields(count = payload.images.len()))]
pub async fn upload_base64(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Base64UploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.images.is_empty() {
        return Err(AppError::Validation("images must not be empty".into()));
    }
    let files = state.media.store_base64_batch(&payload.images).await?;
    tracing::info!(count = files.len(), "Stored base64 images");
    Ok((StatusCode::CREATED, Json(UploadResponse { files })))
}

/// Idempotent: a missing file or an external URL is still a success.
#[instrument(skip(state, payload), fields(path = %payload.path))]
pub async fn delete_media(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteMediaRequest>,
) -> Result<Json<DeleteMediaResponse>, AppError> {
    let path = payload.path.trim().to_string();
    if path.is_empty() {
        return Err(AppError::Validation("path is required".into()));
    }
    let removal = state.media.delete(&path).await?;
    Ok(Json(DeleteMediaResponse::new(path, removal)))
}
