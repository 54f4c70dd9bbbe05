use std::path::PathBuf;

use serde::Deserialize;

use crate::storage::UploadPolicy;

/// Media storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for stored files. Blank or unset: `<cwd>/uploads`.
    #[serde(default)]
    pub upload_dir: Option<String>,
    /// First segment of every public media path. Default: "uploads".
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Upload size ceiling in bytes. Default: 5 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// MIME types accepted for binary uploads.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

fn default_public_prefix() -> String {
    "uploads".into()
}
fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}
fn default_allowed_mime_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: None,
            public_prefix: default_public_prefix(),
            max_file_size: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

impl StorageConfig {
    /// Resolve the absolute storage root.
    pub fn root_dir(&self) -> std::io::Result<PathBuf> {
        match self.upload_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => std::path::absolute(dir),
            _ => Ok(std::env::current_dir()?.join("uploads")),
        }
    }

    /// The checks applied to binary uploads before they reach the store.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.allowed_mime_types.clone(), self.max_file_size)
    }
}
