//! Media side effects around an entity mutation.
//!
//! New files are stored before the database commit and removed again if the
//! mutation fails afterwards. Files superseded by a replacement are deleted
//! before the new one is written. Files of removed entities are deleted only
//! after the removal has committed, and a failure there is a warning.

use media::storage::{MediaInput, MediaStore, Removal, StorageError, is_external};

/// Tracks the files one mutation has written so they can be compensated.
pub struct MediaLifecycle<'a> {
    store: &'a dyn MediaStore,
    fresh: Vec<String>,
}

impl<'a> MediaLifecycle<'a> {
    pub fn new(store: &'a dyn MediaStore) -> Self {
        Self {
            store,
            fresh: Vec::new(),
        }
    }

    /// Store media for a new entity and return the path to attach.
    pub async fn attach(&mut self, input: MediaInput) -> Result<String, StorageError> {
        let asset = self.store.store_input(input).await?;
        let path = asset.path.to_string();
        self.fresh.push(path.clone());
        Ok(path)
    }

    /// Delete the entity's current owned file, then store the new one.
    ///
    /// A failed delete (other than a missing file) aborts before anything new
    /// is written. External URLs are left alone.
    pub async fn replace(
        &mut self,
        current: Option<&str>,
        input: MediaInput,
    ) -> Result<String, StorageError> {
        if let Some(current) = current.map(str::trim).filter(|p| !p.is_empty()) {
            if is_external(current) {
                tracing::debug!(path = current, "Keeping external media reference");
            } else {
                self.store.delete(current).await?;
            }
        }
        self.attach(input).await
    }

    /// Settle the mutation: keep fresh files on success, remove them otherwise.
    pub async fn finish<T, E>(self, outcome: Result<T, E>) -> Result<T, E> {
        if outcome.is_err() {
            self.discard().await;
        }
        outcome
    }

    /// Remove every file written by this mutation. Best effort.
    pub async fn discard(self) {
        for path in &self.fresh {
            match self.store.delete(path).await {
                Ok(_) => tracing::info!(path, "Removed media of failed mutation"),
                Err(e) => {
                    tracing::warn!(path, error = %e, "Failed to remove media of failed mutation")
                }
            }
        }
    }
}

/// Delete the file of an entity that has already been removed.
///
/// Returns a warning instead of failing: the entity is gone either way and the
/// now unreferenced file can be deleted again at any time.
pub async fn release(store: &dyn MediaStore, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    match store.delete(path).await {
        Ok(Removal::Deleted) | Ok(Removal::Missing) | Ok(Removal::External) => None,
        Err(e) => {
            tracing::warn!(path, error = %e, "Degraded media cleanup after removal");
            Some(format!("Media file {path} could not be removed: {e}"))
        }
    }
}
