//! File-backed key-value storage.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temporary sibling
//! and are renamed into place; readers only ever see complete payloads.

use critter_core::storage::{Storage, StorageError, StorageFuture};
use std::path::{Path, PathBuf};

/// [`Storage`] implementation writing one file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store payloads under `dir` (created on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory payloads are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve `key` to its file, rejecting anything that could escape `dir`
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> StorageFuture<'_, Option<String>> {
        let path = self.path_for(key);
        Box::pin(async move {
            let path = path?;
            match tokio::fs::read_to_string(&path).await {
                Ok(payload) => Ok(Some(payload)),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(error) => Err(error.into()),
            }
        })
    }

    fn save(&self, key: &str, payload: String) -> StorageFuture<'_, ()> {
        let path = self.path_for(key);
        Box::pin(async move {
            let path = path?;
            tokio::fs::create_dir_all(&self.dir).await?;

            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, payload).await?;
            tokio::fs::rename(&tmp, &path).await?;

            tracing::trace!(path = %path.display(), "Payload written");
            Ok(())
        })
    }

    fn clear(&self, key: &str) -> StorageFuture<'_, ()> {
        let path = self.path_for(key);
        Box::pin(async move {
            let path = path?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(error.into()),
            }
        })
    }
}
