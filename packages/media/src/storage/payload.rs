use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::error::StorageError;

/// Data URIs in the wild arrive both with and without trailing padding.
const DATA_URI_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A binary upload as received at the request boundary.
///
/// Consumed once by the store and never persisted itself.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedPayload {
    bytes: Vec<u8>,
    original_name: String,
    mime_type: String,
}

impl UploadedPayload {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Filename declared by the client.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// MIME type declared by the client.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for UploadedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedPayload")
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A decoded `data:image/<ext>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    extension: String,
    bytes: Vec<u8>,
}

impl DataUri {
    /// Parse and decode a base64 image data URI.
    ///
    /// A shape mismatch is a [`StorageError::Format`]; undecodable or empty
    /// payloads are a [`StorageError::Validation`].
    pub fn parse(input: &str) -> Result<Self, StorageError> {
        if input.is_empty() {
            return Err(StorageError::Validation("no base64 string provided".into()));
        }

        let (extension, encoded) = input
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(";base64,"))
            .filter(|(ext, payload)| {
                !ext.is_empty()
                    && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && !payload.is_empty()
                    && !payload.contains(['\n', '\r'])
            })
            .ok_or_else(|| {
                StorageError::Format("expected data:image/<ext>;base64,<payload>".into())
            })?;

        let bytes = DATA_URI_ENGINE
            .decode(encoded)
            .map_err(|e| StorageError::Validation(format!("malformed base64 payload: {e}")))?;

        if bytes.is_empty() {
            return Err(StorageError::Validation("base64 payload is empty".into()));
        }

        Ok(Self {
            extension: extension.to_string(),
            bytes,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Media accepted by the mutation orchestrators.
#[derive(Debug, Clone)]
pub enum MediaInput {
    Upload(UploadedPayload),
    /// A `data:image/<ext>;base64,...` string, decoded by the store.
    DataUri(String),
}

impl From<UploadedPayload> for MediaInput {
    fn from(payload: UploadedPayload) -> Self {
        Self::Upload(payload)
    }
}

/// Boundary checks for binary uploads: MIME allow-list and size ceiling.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_mime_types: Vec<String>,
    max_size: u64,
}

impl UploadPolicy {
    pub fn new(allowed_mime_types: Vec<String>, max_size: u64) -> Self {
        Self {
            allowed_mime_types,
            max_size,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn allows_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type.trim()))
    }

    pub fn check(&self, payload: &UploadedPayload) -> Result<(), StorageError> {
        if payload.is_empty() {
            return Err(StorageError::Validation("file buffer is empty".into()));
        }
        if payload.size() > self.max_size {
            return Err(StorageError::Validation(format!(
                "file exceeds maximum size of {} bytes",
                self.max_size
            )));
        }
        if !self.allows_mime(payload.mime_type()) {
            return Err(StorageError::Validation(format!(
                "file type {} is not allowed (accepted: {})",
                payload.mime_type(),
                self.allowed_mime_types.join(", ")
            )));
        }
        Ok(())
    }
}
