use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use super::error::StorageError;

/// Public path of a stored file: `/{prefix}/{yyyy}/{mm}/{filename}`.
///
/// The year and month are the wall-clock time of the store call and double as
/// the on-disk shard directories below the storage root.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MediaPath {
    prefix: String,
    year: i32,
    month: u32,
    filename: String,
}

impl MediaPath {
    pub(crate) fn new(prefix: &str, year: i32, month: u32, filename: String) -> Self {
        Self {
            prefix: prefix.to_string(),
            year,
            month,
            filename,
        }
    }

    /// Parse a public path owned by the store with the given prefix.
    ///
    /// Only the exact `/{prefix}/{yyyy}/{mm}/{filename}` shape is accepted. A
    /// missing leading slash is tolerated; parent-directory segments never are.
    pub fn parse(prefix: &str, input: &str) -> Result<Self, StorageError> {
        let trimmed = input.trim();
        let relative = trimmed.strip_prefix('/').unwrap_or(trimmed);

        if relative.contains('\0') {
            return Err(StorageError::InvalidPath(
                "null bytes are not allowed".into(),
            ));
        }
        if relative.contains('\\') {
            return Err(StorageError::InvalidPath(
                "backslashes are not allowed".into(),
            ));
        }
        if contains_path_traversal(relative) {
            return Err(StorageError::InvalidPath(format!(
                "parent-directory segments are not allowed: {trimmed}"
            )));
        }

        let segments: Vec<&str> = relative.split('/').collect();
        let [root, year, month, filename] = segments.as_slice() else {
            return Err(StorageError::InvalidPath(format!(
                "expected /{prefix}/YYYY/MM/<file>, got {trimmed}"
            )));
        };

        if *root != prefix {
            return Err(StorageError::InvalidPath(format!(
                "path is not under /{prefix}: {trimmed}"
            )));
        }

        let year = parse_digits(year, 4)
            .ok_or_else(|| StorageError::InvalidPath(format!("invalid year segment: {year}")))?;
        let month = parse_digits(month, 2)
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| StorageError::InvalidPath(format!("invalid month segment: {month}")))?;

        let name = validate_flat_filename(filename)
            .map_err(|reason| StorageError::InvalidPath(reason.into()))?;
        if name != *filename {
            return Err(StorageError::InvalidPath(
                "filename must not carry surrounding whitespace".into(),
            ));
        }

        Ok(Self::new(prefix, year as i32, month, name.to_string()))
    }

    /// Location relative to the storage root.
    pub fn relative(&self) -> PathBuf {
        Path::new(&self.shard_year())
            .join(self.shard_month())
            .join(&self.filename)
    }

    pub fn shard_year(&self) -> String {
        format!("{:04}", self.year)
    }

    pub fn shard_month(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Extension of the stored filename, without the dot.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

fn parse_digits(segment: &str, width: usize) -> Option<u32> {
    if segment.len() != width || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{:04}/{:02}/{}",
            self.prefix, self.year, self.month, self.filename
        )
    }
}

impl fmt::Debug for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaPath({self})")
    }
}

impl Serialize for MediaPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether a stored reference points at an externally hosted resource.
///
/// Anything starting with a URI scheme (`https:`, `http:`, `s3:` ...) is not
/// owned by the local store and must never be deleted by it.
pub fn is_external(path: &str) -> bool {
    let Some((scheme, _)) = path.trim().split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    // Require two characters so `C:\...` style drive letters stay local.
    scheme.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, &'static str> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err("filename cannot be empty");
    }
    if trimmed.contains('\0') {
        return Err("null bytes are not allowed in filenames");
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err("control characters are not allowed in filenames");
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err("path separators are not allowed in filenames");
    }
    if trimmed == ".." {
        return Err("'..' is not a filename");
    }
    if trimmed.starts_with('.') {
        return Err("hidden filenames are not allowed");
    }

    Ok(trimmed)
}

/// Checks if a path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
        || path.starts_with("..\\")
        || path.contains("\\..\\")
        || path.ends_with("\\..")
}
