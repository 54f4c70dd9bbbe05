use serde::Serialize;

use crate::error::AppError;

/// Response of a removal. `warnings` lists degraded media cleanup.
#[derive(Serialize)]
pub struct RemovalResponse {
    pub id: String,
    pub warnings: Vec<String>,
}

/// Blank strings clear a nullable text column.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Validate a trimmed name (1-255 Unicode characters).
pub fn validate_name(value: &str, field: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 255 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-255 characters"
        )));
    }
    Ok(())
}
