use std::fmt;

/// Errors that can occur during media storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The payload is missing, empty, or cannot be decoded.
    Validation(String),
    /// A data URI does not have the `data:image/<ext>;base64,<payload>` shape.
    Format(String),
    /// A media path is malformed or resolves outside the storage root.
    InvalidPath(String),
    /// No stored file exists at the given path.
    NotFound(String),
    /// An I/O error other than a missing file.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "invalid media payload: {msg}"),
            Self::Format(msg) => write!(f, "invalid data URI: {msg}"),
            Self::InvalidPath(msg) => write!(f, "invalid media path: {msg}"),
            Self::NotFound(path) => write!(f, "media not found: {path}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
