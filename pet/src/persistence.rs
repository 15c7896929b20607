//! Snapshot persistence adapter.
//!
//! Encodes the flat [`Snapshot`] as JSON under one storage key. Loading is
//! tolerant: every field decodes on its own, so one bad value only costs
//! that field, and any storage failure falls back to a fresh egg. Saves are
//! tagged with a revision; a save older than the last write is dropped, so
//! fire-and-forget saves can finish in any order without going backwards.

use crate::types::{PetState, PoopCount, Snapshot, Stage, Stat, messages};
use critter_core::Storage;
use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Reads and writes the pet snapshot through a [`Storage`] backend
pub struct SnapshotAdapter {
    storage: Arc<dyn Storage>,
    key: String,
    last_revision: Mutex<Option<u64>>,
}

impl std::fmt::Debug for SnapshotAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotAdapter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SnapshotAdapter {
    /// Adapter persisting under `key`
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            last_revision: Mutex::new(None),
        }
    }

    /// Storage key in use
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted pet, or a fresh egg if there is nothing usable
    pub async fn load(&self) -> PetState {
        match self.storage.load(&self.key).await {
            Ok(Some(payload)) => match PartialSnapshot::parse(&payload) {
                Ok(partial) => {
                    let pet = partial.into_state();
                    tracing::info!(stage = %pet.stage, age = pet.age, "Restored pet from snapshot");
                    pet
                },
                Err(error) => {
                    tracing::warn!(key = %self.key, %error, "Unreadable snapshot, starting fresh");
                    PetState::new()
                },
            },
            Ok(None) => {
                tracing::debug!(key = %self.key, "No snapshot, starting fresh");
                PetState::new()
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Failed to load snapshot, starting fresh");
                PetState::new()
            },
        }
    }

    /// Persist `snapshot` unless a newer revision has already been written.
    ///
    /// Returns whether the snapshot was written.
    pub async fn save(&self, revision: u64, snapshot: Snapshot) -> bool {
        let mut last = self.last_revision.lock().await;
        if last.is_some_and(|last| revision <= last) {
            tracing::trace!(revision, "Dropping stale snapshot save");
            return false;
        }

        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "Failed to encode snapshot");
                return false;
            },
        };

        *last = Some(revision);
        match self.storage.save(&self.key, payload).await {
            Ok(()) => {
                tracing::trace!(revision, "Snapshot saved");
                true
            },
            Err(error) => {
                tracing::warn!(key = %self.key, revision, %error, "Failed to save snapshot");
                false
            },
        }
    }

    /// Remove the persisted snapshot; saves older than `revision` are dropped
    pub async fn clear(&self, revision: u64) -> bool {
        let mut last = self.last_revision.lock().await;
        if last.is_some_and(|last| revision <= last) {
            return false;
        }

        *last = Some(revision);
        match self.storage.clear(&self.key).await {
            Ok(()) => {
                tracing::debug!(key = %self.key, "Snapshot cleared");
                true
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Failed to clear snapshot");
                false
            },
        }
    }
}

/// Decode a field on its own; anything malformed becomes `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A snapshot as read from storage, every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialSnapshot {
    #[serde(deserialize_with = "lenient")]
    stage: Option<Stage>,
    #[serde(deserialize_with = "lenient")]
    hunger: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    happiness: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    health: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    poop_count: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    age: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    is_sleeping: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    care_mistakes: Option<i64>,
}

impl PartialSnapshot {
    /// Parse a stored payload.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not JSON or is a bare scalar.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Fill missing fields from the defaults and clamp the rest into range
    #[must_use]
    pub fn into_state(self) -> PetState {
        let defaults = PetState::new();
        let counter = |value: Option<i64>, default: u32| {
            value.map_or(default, |v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        };

        let stage = self.stage.unwrap_or(defaults.stage);
        let message = if stage == Stage::Egg {
            messages::WAITING
        } else {
            messages::RESUMED
        };

        PetState {
            stage,
            hunger: self.hunger.map_or(defaults.hunger, Stat::new),
            happiness: self.happiness.map_or(defaults.happiness, Stat::new),
            health: self.health.map_or(defaults.health, Stat::new),
            poop_count: self.poop_count.map_or(defaults.poop_count, PoopCount::new),
            age: counter(self.age, defaults.age),
            is_sleeping: stage.is_active() && self.is_sleeping.unwrap_or(defaults.is_sleeping),
            care_mistakes: counter(self.care_mistakes, defaults.care_mistakes),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critter_testing::InMemoryStorage;

    const KEY: &str = "tamagotchi-pet";

    fn adapter(storage: &InMemoryStorage) -> SnapshotAdapter {
        SnapshotAdapter::new(Arc::new(storage.clone()), KEY)
    }

    fn child_snapshot(hunger: u8) -> Snapshot {
        Snapshot::from(&PetState {
            stage: Stage::Child,
            hunger: Stat::new(i64::from(hunger)),
            ..PetState::new()
        })
    }

    #[test]
    fn missing_fields_are_default_filled() {
        let pet = PartialSnapshot::parse(r#"{"stage":"child","hunger":40}"#)
            .map(PartialSnapshot::into_state)
            .unwrap_or_default();

        assert_eq!(pet.stage, Stage::Child);
        assert_eq!(pet.hunger, 40);
        assert_eq!(pet.happiness, 100);
        assert_eq!(pet.health, 100);
        assert_eq!(pet.message, messages::RESUMED);
    }

    #[test]
    fn malformed_fields_only_lose_themselves() {
        let pet = PartialSnapshot::parse(
            r#"{"stage":"dragon","hunger":"lots","health":55,"poopCount":null,"age":12}"#,
        )
        .map(PartialSnapshot::into_state)
        .unwrap_or_default();

        assert_eq!(pet.stage, Stage::Egg);
        assert_eq!(pet.hunger, 100);
        assert_eq!(pet.health, 55);
        assert_eq!(pet.poop_count, 0);
        assert_eq!(pet.age, 12);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let pet = PartialSnapshot::parse(
            r#"{"stage":"adult","hunger":250,"happiness":-4,"poopCount":9,"careMistakes":-1}"#,
        )
        .map(PartialSnapshot::into_state)
        .unwrap_or_default();

        assert_eq!(pet.hunger, 100);
        assert_eq!(pet.happiness, 0);
        assert_eq!(pet.poop_count, 4);
        assert_eq!(pet.care_mistakes, 0);
    }

    #[test]
    fn only_active_pets_can_be_asleep() {
        let pet = PartialSnapshot::parse(r#"{"stage":"dead","isSleeping":true}"#)
            .map(PartialSnapshot::into_state)
            .unwrap_or_default();

        assert_eq!(pet.stage, Stage::Dead);
        assert!(!pet.is_sleeping);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(PartialSnapshot::parse("not json").is_err());
        assert!(PartialSnapshot::parse("42").is_err());
    }

    #[tokio::test]
    async fn load_falls_back_to_defaults() {
        let storage = InMemoryStorage::with_payload(KEY, "{{{");
        assert_eq!(adapter(&storage).load().await, PetState::new());

        let empty = InMemoryStorage::new();
        assert_eq!(adapter(&empty).load().await, PetState::new());

        let broken = InMemoryStorage::with_payload(KEY, r#"{"stage":"adult"}"#);
        broken.set_failing(true);
        assert_eq!(adapter(&broken).load().await, PetState::new());
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let storage = InMemoryStorage::new();
        let adapter = adapter(&storage);

        assert!(adapter.save(1, child_snapshot(42)).await);
        let pet = adapter.load().await;

        assert_eq!(Snapshot::from(&pet), child_snapshot(42));
        assert!(storage.get(KEY).is_some_and(|json| json.contains("\"poopCount\":0")));
    }

    #[test]
    fn stale_revisions_are_dropped() {
        let storage = InMemoryStorage::new();
        let adapter = adapter(&storage);

        tokio_test::block_on(async {
            assert!(adapter.save(3, child_snapshot(30)).await);
            assert!(!adapter.save(2, child_snapshot(20)).await);
            assert!(!adapter.save(3, child_snapshot(35)).await);
        });

        assert_eq!(storage.save_count(), 1);
        assert!(storage.get(KEY).is_some_and(|json| json.contains("\"hunger\":30")));
    }

    #[test]
    fn clear_fences_off_older_saves() {
        let storage = InMemoryStorage::with_payload(KEY, "{}");
        let adapter = adapter(&storage);

        tokio_test::block_on(async {
            assert!(adapter.clear(5).await);
            assert!(!adapter.save(4, child_snapshot(10)).await);
        });

        assert_eq!(storage.get(KEY), None);
        assert_eq!(storage.clear_count(), 1);
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let storage = InMemoryStorage::new();
        storage.set_failing(true);
        let adapter = adapter(&storage);

        let saved = tokio_test::block_on(adapter.save(1, child_snapshot(50)));

        assert!(!saved);
    }
}
