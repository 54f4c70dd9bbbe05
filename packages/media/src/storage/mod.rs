mod error;
mod path;
mod payload;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use path::{MediaPath, contains_path_traversal, is_external, validate_flat_filename};
pub use payload::{DataUri, MediaInput, UploadPolicy, UploadedPayload};
pub use traits::{MediaAsset, MediaStore, Removal};
pub use filesystem::FilesystemMediaStore;
