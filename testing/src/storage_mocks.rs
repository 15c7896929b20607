//! In-memory storage for fast, deterministic persistence tests
//!
//! [`InMemoryStorage`] mirrors the `FileStorage` contract without touching
//! the filesystem, and can be switched into a failing mode to exercise the
//! engine's recovery paths.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use critter_core::storage::{Storage, StorageError, StorageFuture};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory key-value storage.
///
/// # Example
///
/// ```
/// use critter_testing::InMemoryStorage;
/// use critter_core::Storage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = InMemoryStorage::new();
/// storage.save("pet", "{}".to_string()).await?;
/// assert_eq!(storage.get("pet").as_deref(), Some("{}"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with one payload
    #[must_use]
    pub fn with_payload(key: &str, payload: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.insert(key, payload);
        storage
    }

    /// Put a payload directly, bypassing the save counter
    pub fn insert(&self, key: &str, payload: impl Into<String>) {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), payload.into());
    }

    /// Read a payload directly
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Make every subsequent operation fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of successful clears
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Storage for InMemoryStorage {
    fn load(&self, key: &str) -> StorageFuture<'_, Option<String>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check()?;
            Ok(self.get(&key))
        })
    }

    fn save(&self, key: &str, payload: String) -> StorageFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            self.check()?;
            self.data.write().unwrap().insert(key, payload);
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn clear(&self, key: &str) -> StorageFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            self.check()?;
            self.data.write().unwrap().remove(&key);
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_clear() {
        let storage = InMemoryStorage::new();
        storage.save("k", "v".to_string()).await.unwrap();
        assert_eq!(storage.load("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(storage.save_count(), 1);

        storage.clear("k").await.unwrap();
        assert!(storage.load("k").await.unwrap().is_none());
        assert_eq!(storage.clear_count(), 1);
    }

    #[tokio::test]
    async fn failing_mode_rejects_everything() {
        let storage = InMemoryStorage::with_payload("k", "v");
        storage.set_failing(true);

        assert!(storage.load("k").await.is_err());
        assert!(storage.save("k", "w".to_string()).await.is_err());
        assert_eq!(storage.get("k").as_deref(), Some("v"));
    }
}
