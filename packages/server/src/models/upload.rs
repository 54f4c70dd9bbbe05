use media::storage::{MediaAsset, Removal};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct Base64UploadRequest {
    /// `data:image/<ext>;base64,<payload>` strings.
    pub images: Vec<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub files: Vec<MediaAsset>,
}

#[derive(Deserialize)]
pub struct DeleteMediaRequest {
    pub path: String,
}

#[derive(Serialize)]
pub struct DeleteMediaResponse {
    pub path: String,
    /// One of: `deleted`, `missing`, `external`.
    pub status: &'static str,
}

impl DeleteMediaResponse {
    pub fn new(path: String, removal: Removal) -> Self {
        let status = match removal {
            Removal::Deleted => "deleted",
            Removal::Missing => "missing",
            Removal::External => "external",
        };
        Self { path, status }
    }
}
