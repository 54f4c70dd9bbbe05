use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use media::storage::{MediaInput, UploadPolicy, UploadedPayload};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::relations::FieldUpdate;
use crate::state::AppState;

/// Fields of a media-bearing mutation that can arrive as multipart text parts.
pub trait FormFields: Default {
    /// Multipart file part carrying the entity's media.
    const MEDIA_FIELD: &'static str = "image";

    /// Assign one multipart text part. Unknown names are ignored.
    fn set_field(&mut self, name: &str, value: String) -> Result<(), AppError>;

    /// Media supplied inline as a base64 data URI field.
    fn take_inline_media(&mut self) -> Option<MediaInput> {
        None
    }
}

/// Body of a create/update request: plain fields plus optional media.
///
/// Accepts `multipart/form-data` (media as a file part, checked against the
/// upload policy here) or JSON (media as a data URI field).
pub struct MutationForm<T> {
    pub fields: T,
    pub media: Option<MediaInput>,
}

impl<T> FromRequest<AppState> for MutationForm<T>
where
    T: FormFields + DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let AppJson(mut fields) = AppJson::<T>::from_request(req, state).await?;
            let media = fields.take_inline_media();
            return Ok(Self { fields, media });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
        let policy = state.config.storage.upload_policy();

        let mut fields = T::default();
        let mut media: Option<MediaInput> = None;
        while let Some(field) = next_field(&mut multipart).await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == T::MEDIA_FIELD && field.file_name().is_some_and(|n| !n.is_empty()) {
                if media.is_some() {
                    return Err(AppError::Validation(format!(
                        "Only one '{name}' file is accepted"
                    )));
                }
                media = Some(read_upload(field, &policy).await?.into());
            } else {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read field '{name}': {e}"))
                })?;
                fields.set_field(&name, text)?;
            }
        }

        let media = media.or_else(|| fields.take_inline_media());
        Ok(Self { fields, media })
    }
}

/// Multipart body of the batch upload endpoint: every `files` part.
pub struct UploadBatch(pub Vec<UploadedPayload>);

impl FromRequest<AppState> for UploadBatch {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
        let policy = state.config.storage.upload_policy();

        let mut payloads = Vec::new();
        while let Some(field) = next_field(&mut multipart).await? {
            if field.name() == Some("files") {
                payloads.push(read_upload(field, &policy).await?);
            }
        }

        if payloads.is_empty() {
            return Err(AppError::Validation("Missing 'files' field".into()));
        }
        Ok(Self(payloads))
    }
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))
}

/// Buffer one file part, enforcing the size ceiling while reading.
async fn read_upload(
    mut field: Field<'_>,
    policy: &UploadPolicy,
) -> Result<UploadedPayload, AppError> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let mime_type = match field.content_type() {
        Some(ct) if ct != "application/octet-stream" => ct.to_string(),
        _ => mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string(),
    };

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file '{file_name}': {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > policy.max_size() {
            return Err(AppError::Validation(format!(
                "File '{file_name}' exceeds maximum size of {} bytes",
                policy.max_size()
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    let payload = UploadedPayload::new(bytes, file_name, mime_type);
    policy.check(&payload)?;
    Ok(payload)
}

/// Text part for a nullable column. Blank clears.
pub fn nullable_text(value: String) -> FieldUpdate<Option<String>> {
    FieldUpdate::Provided(Some(value))
}

/// Text part parsed as a number; blank clears.
pub fn nullable_number<N: std::str::FromStr>(
    name: &str,
    value: &str,
) -> Result<FieldUpdate<Option<N>>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(FieldUpdate::Provided(None));
    }
    value
        .parse()
        .map(|n| FieldUpdate::Provided(Some(n)))
        .map_err(|_| AppError::Validation(format!("'{name}' must be a number")))
}

pub fn number<N: std::str::FromStr>(name: &str, value: &str) -> Result<FieldUpdate<N>, AppError> {
    value
        .trim()
        .parse()
        .map(FieldUpdate::Provided)
        .map_err(|_| AppError::Validation(format!("'{name}' must be a number")))
}

pub fn boolean(name: &str, value: &str) -> Result<FieldUpdate<bool>, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(FieldUpdate::Provided(true)),
        "false" | "0" | "off" | "no" => Ok(FieldUpdate::Provided(false)),
        _ => Err(AppError::Validation(format!("'{name}' must be a boolean"))),
    }
}

/// Text part holding a JSON array of IDs, e.g. `[1, 2]`.
pub fn id_list<I: DeserializeOwned>(name: &str, value: &str) -> Result<FieldUpdate<Vec<I>>, AppError> {
    serde_json::from_str(value)
        .map(FieldUpdate::Provided)
        .map_err(|e| AppError::Validation(format!("'{name}' must be a JSON array of IDs: {e}")))
}
