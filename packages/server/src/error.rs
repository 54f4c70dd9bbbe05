use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use media::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::relations::RelationError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `FORMAT_ERROR`,
    /// `NOT_FOUND`, `CONFLICT`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Empty or missing payload, undecodable base64, bad field values.
    Validation(String),
    /// A data URI that is not `data:image/<ext>;base64,<payload>`.
    Format(String),
    NotFound(String),
    Conflict(String),
    /// Storage I/O failure other than a missing file.
    Storage(String),
    Internal(String),
}

impl AppError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Format(_) => "FORMAT_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        match self {
            AppError::Validation(msg) | AppError::Format(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody { code, message: msg })
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody { code, message: msg }),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody { code, message: msg }),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code,
                        message: "Media storage failed".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code,
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg)
            | AppError::Format(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Storage(msg)
            | AppError::Internal(msg) => write!(f, "{}: {}", self.code(), msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(msg) => AppError::Validation(msg),
            StorageError::Format(msg) => AppError::Format(msg),
            StorageError::InvalidPath(msg) => {
                tracing::warn!("Rejected media path: {msg}");
                AppError::Validation(format!("Invalid media path: {msg}"))
            }
            StorageError::NotFound(path) => AppError::NotFound(format!("Media '{path}' not found")),
            StorageError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<RelationError> for AppError {
    fn from(err: RelationError) -> Self {
        match err {
            RelationError::Unresolved { .. } => AppError::NotFound(err.to_string()),
            RelationError::Database(e) => e.into(),
        }
    }
}

/// Map a unique-constraint violation to `Conflict`, anything else as usual.
pub fn conflict_on_unique(err: DbErr, message: impl Into<String>) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
        _ => err.into(),
    }
}
