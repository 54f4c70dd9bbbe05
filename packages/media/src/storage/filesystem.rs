use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::fs;

use crate::config::StorageConfig;

use super::error::StorageError;
use super::path::{MediaPath, is_external, validate_flat_filename};
use super::payload::{DataUri, UploadedPayload};
use super::traits::{MediaAsset, MediaStore, Removal};

/// Attempts at finding a free filename before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Length of the random token appended to generated names.
const TOKEN_LEN: usize = 11;

/// Filesystem-backed media store.
///
/// Files are sharded by the wall-clock month of the store call:
/// `{root}/{yyyy}/{mm}/{filename}`, published as `/{prefix}/{yyyy}/{mm}/{filename}`.
/// Writes land in `{root}/.tmp` first and are linked into place, so a reader
/// never observes a partially written file and an existing file is never
/// overwritten.
pub struct FilesystemMediaStore {
    root: PathBuf,
    prefix: String,
}

/// How a stored file gets its name.
enum NameScheme<'a> {
    /// `{stem}-{millis}.{ext}`, as uploaded.
    Upload { stem: &'a str, extension: Option<&'a str> },
    /// `base64-{millis}-{token}.{ext}`.
    Base64 { extension: &'a str },
}

impl NameScheme<'_> {
    /// The first upload attempt keeps the plain timestamped name; retries and
    /// base64 names carry a random token.
    fn filename(&self, millis: i64, attempt: usize) -> String {
        match self {
            Self::Upload { stem, extension } => {
                let base = if attempt == 0 {
                    format!("{stem}-{millis}")
                } else {
                    format!("{stem}-{millis}-{}", random_token())
                };
                match extension {
                    Some(ext) => format!("{base}.{ext}"),
                    None => base,
                }
            }
            Self::Base64 { extension } => {
                format!("base64-{millis}-{}.{extension}", random_token())
            }
        }
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

impl FilesystemMediaStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Result<Self, StorageError> {
        let prefix = public_prefix.trim().trim_matches('/');
        if validate_flat_filename(prefix).is_err() {
            return Err(StorageError::InvalidPath(format!(
                "public prefix must be a single path segment, got {public_prefix:?}"
            )));
        }

        let root = root.into();
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        let root = fs::canonicalize(&root).await?;

        tracing::info!(root = %root.display(), prefix, "Media storage ready");
        Ok(Self {
            root,
            prefix: prefix.to_string(),
        })
    }

    /// Create a store from configuration resolved at startup.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(config.root_dir()?, &config.public_prefix).await
    }

    /// Canonical storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.prefix
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn store_payload_at(
        &self,
        payload: &UploadedPayload,
        now: DateTime<Utc>,
    ) -> Result<MediaAsset, StorageError> {
        if payload.is_empty() {
            return Err(StorageError::Validation("file buffer is empty".into()));
        }

        let declared = payload
            .original_name()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let name = validate_flat_filename(declared)
            .map_err(|reason| StorageError::Validation(reason.into()))?;

        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
            _ => (name.trim_end_matches('.'), extension_for_mime(payload.mime_type())),
        };

        self.write_at(now, &NameScheme::Upload { stem, extension }, payload.bytes())
            .await
    }

    async fn store_data_uri_at(
        &self,
        data_uri: &str,
        now: DateTime<Utc>,
    ) -> Result<MediaAsset, StorageError> {
        let decoded = DataUri::parse(data_uri)?;
        self.write_at(
            now,
            &NameScheme::Base64 {
                extension: decoded.extension(),
            },
            decoded.bytes(),
        )
        .await
    }

    async fn write_at(
        &self,
        now: DateTime<Utc>,
        scheme: &NameScheme<'_>,
        data: &[u8],
    ) -> Result<MediaAsset, StorageError> {
        if data.is_empty() {
            return Err(StorageError::Validation("file buffer is empty".into()));
        }

        let (year, month) = (now.year(), now.month());
        let shard = self
            .root
            .join(format!("{year:04}"))
            .join(format!("{month:02}"));
        fs::create_dir_all(&shard).await?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let millis = now.timestamp_millis();
        let mut placed = None;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = scheme.filename(millis, attempt);
            // hard_link refuses to replace an existing file, unlike rename.
            match fs::hard_link(&temp_path, shard.join(&filename)).await {
                Ok(()) => {
                    placed = Some(filename);
                    break;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(filename, "Media filename taken, retrying");
                }
                Err(e) => {
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            }
        }
        let _ = fs::remove_file(&temp_path).await;

        let filename = placed.ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                "could not find a free media filename",
            ))
        })?;

        let path = MediaPath::new(&self.prefix, year, month, filename);
        let extension = path.extension().map(str::to_string);
        let content_type = mime_guess::from_path(path.filename())
            .first()
            .map(|m| m.to_string());

        tracing::info!(path = %path, size = data.len(), "Stored media");
        Ok(MediaAsset {
            path,
            size: data.len() as u64,
            extension,
            content_type,
        })
    }

    /// Map a public path onto the filesystem, refusing anything that escapes
    /// the root. `None` when the shard directory does not exist.
    async fn resolve(&self, path: &MediaPath) -> Result<Option<PathBuf>, StorageError> {
        let shard = self.root.join(path.shard_year()).join(path.shard_month());
        let shard = match fs::canonicalize(&shard).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !shard.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(format!(
                "{path} resolves outside the storage root"
            )));
        }
        Ok(Some(shard.join(path.filename())))
    }
}

/// Extension for uploads whose declared filename has none.
fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        other => mime_guess::get_mime_extensions_str(other).and_then(|exts| exts.first().copied()),
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn store(&self, payload: UploadedPayload) -> Result<MediaAsset, StorageError> {
        self.store_payload_at(&payload, Utc::now()).await
    }

    async fn store_base64(&self, data_uri: &str) -> Result<MediaAsset, StorageError> {
        self.store_data_uri_at(data_uri, Utc::now()).await
    }

    async fn delete(&self, path: &str) -> Result<Removal, StorageError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Ok(Removal::Missing);
        }
        if is_external(trimmed) {
            tracing::debug!(path = trimmed, "Skipping delete of external media");
            return Ok(Removal::External);
        }

        let media_path = MediaPath::parse(&self.prefix, trimmed)?;
        let Some(target) = self.resolve(&media_path).await? else {
            return Ok(Removal::Missing);
        };

        match fs::remove_file(&target).await {
            Ok(()) => {
                tracing::info!(path = %media_path, "Deleted media");
                Ok(Removal::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::Missing),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let media_path = MediaPath::parse(&self.prefix, path)?;
        let not_found = || StorageError::NotFound(media_path.to_string());

        let target = self.resolve(&media_path).await?.ok_or_else(not_found)?;
        let target = match fs::canonicalize(&target).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        if !target.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(format!(
                "{media_path} resolves outside the storage root"
            )));
        }

        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}
