use async_trait::async_trait;
use serde::Serialize;

use super::error::StorageError;
use super::path::MediaPath;
use super::payload::{MediaInput, UploadedPayload};

/// A file written by a [`MediaStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAsset {
    /// Public path, persisted on the owning entity.
    pub path: MediaPath,
    /// Stored size in bytes.
    pub size: u64,
    /// Extension of the stored file, without the dot.
    pub extension: Option<String>,
    /// MIME type guessed from the stored filename.
    pub content_type: Option<String>,
}

/// Outcome of an idempotent delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The file existed and was removed.
    Deleted,
    /// Nothing was stored at the path. Not an error.
    Missing,
    /// The path is an external URL; the store does not own it.
    External,
}

/// Time-sharded media storage addressed by public path.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store a binary upload and return the written asset.
    async fn store(&self, payload: UploadedPayload) -> Result<MediaAsset, StorageError>;

    /// Decode and store a `data:image/<ext>;base64,<payload>` string.
    async fn store_base64(&self, data_uri: &str) -> Result<MediaAsset, StorageError>;

    /// Delete a stored file by public path.
    ///
    /// A missing file is success ([`Removal::Missing`]); external URLs are
    /// skipped ([`Removal::External`]).
    async fn delete(&self, path: &str) -> Result<Removal, StorageError>;

    /// Read back the bytes stored at a public path.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    async fn store_input(&self, input: MediaInput) -> Result<MediaAsset, StorageError> {
        match input {
            MediaInput::Upload(payload) => self.store(payload).await,
            MediaInput::DataUri(data_uri) => self.store_base64(&data_uri).await,
        }
    }

    /// Store several uploads concurrently.
    ///
    /// All or nothing: when any item fails, the files already written by this
    /// batch are removed before the first error is returned.
    async fn store_batch(
        &self,
        payloads: Vec<UploadedPayload>,
    ) -> Result<Vec<MediaAsset>, StorageError> {
        let results =
            futures::future::join_all(payloads.into_iter().map(|payload| self.store(payload)))
                .await;
        settle_batch(self, results).await
    }

    /// Store several data URIs concurrently, with the same all-or-nothing rule.
    async fn store_base64_batch(
        &self,
        data_uris: &[String],
    ) -> Result<Vec<MediaAsset>, StorageError> {
        let results =
            futures::future::join_all(data_uris.iter().map(|uri| self.store_base64(uri))).await;
        settle_batch(self, results).await
    }
}

async fn settle_batch<S: MediaStore + ?Sized>(
    store: &S,
    results: Vec<Result<MediaAsset, StorageError>>,
) -> Result<Vec<MediaAsset>, StorageError> {
    let mut stored = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(asset) => stored.push(asset),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    let Some(err) = first_error else {
        return Ok(stored);
    };

    for asset in &stored {
        if let Err(e) = store.delete(&asset.path.to_string()).await {
            tracing::warn!(path = %asset.path, error = %e, "Failed to roll back batch upload");
        }
    }
    Err(err)
}
