//! Key-value storage abstraction for persisting pet snapshots.
//!
//! The engine needs exactly three operations from its storage medium: read
//! the payload under a key, overwrite it, and remove it. Everything else
//! (encoding, tolerance of bad data, write ordering) lives above this trait.
//!
//! # Implementations
//!
//! - `FileStorage` (in `critter-runtime`): one JSON file per key
//! - `InMemoryStorage` (in `critter-testing`): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
//! so it can be used as `Arc<dyn Storage>` inside effects.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`Storage`] operations
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The key cannot be used by this backend (e.g. contains a path separator).
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused or failed the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistent key-value storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be shared across effect tasks.
pub trait Storage: Send + Sync {
    /// Load the payload stored under `key`.
    ///
    /// A missing key is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn load(&self, key: &str) -> StorageFuture<'_, Option<String>>;

    /// Overwrite the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn save(&self, key: &str, payload: String) -> StorageFuture<'_, ()>;

    /// Remove the payload stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn clear(&self, key: &str) -> StorageFuture<'_, ()>;
}
