//! # Critter Testing
//!
//! Testing utilities and helpers for the critter engine.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - The [`ReducerTest`] Given-When-Then harness
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use critter_testing::{ScriptedRandom, InMemoryStorage};
//!
//! #[tokio::test]
//! async fn hatches_on_a_high_draw() {
//!     let env = PetEnvironment::new(
//!         Arc::new(ScriptedRandom::new([0.95])),
//!         Arc::new(InMemoryStorage::new()),
//!         Arc::new(RecordingSoundPlayer::new()),
//!         PetConfig::default(),
//!     );
//!     // ...
//! }
//! ```

use critter_core::RandomSource;


/// In-memory storage mock
pub mod storage_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::RandomSource;
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Random source that replays a fixed script of draws
    ///
    /// Once the script is exhausted every draw returns the fallback value
    /// (`0.0` unless changed), which never passes a `>` threshold check.
    ///
    /// # Example
    ///
    /// ```
    /// use critter_testing::mocks::ScriptedRandom;
    /// use critter_core::RandomSource;
    ///
    /// let random = ScriptedRandom::new([0.9, 0.1]);
    /// assert_eq!(random.next_f64(), 0.9);
    /// assert_eq!(random.next_f64(), 0.1);
    /// assert_eq!(random.next_f64(), 0.0);
    /// assert_eq!(random.draws_taken(), 3);
    /// ```
    #[derive(Debug)]
    pub struct ScriptedRandom {
        script: Mutex<VecDeque<f64>>,
        fallback: f64,
        taken: Mutex<usize>,
    }

    impl ScriptedRandom {
        /// Create a random source replaying `draws` in order
        #[must_use]
        pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
            Self {
                script: Mutex::new(draws.into_iter().collect()),
                fallback: 0.0,
                taken: Mutex::new(0),
            }
        }

        /// Random source that always returns `value`
        #[must_use]
        pub fn constant(value: f64) -> Self {
            Self::new([]).with_fallback(value)
        }

        /// Value returned once the script runs out
        #[must_use]
        pub const fn with_fallback(mut self, fallback: f64) -> Self {
            self.fallback = fallback;
            self
        }

        /// Append more draws to the script
        pub fn push(&self, draws: impl IntoIterator<Item = f64>) {
            self.script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(draws);
        }

        /// Number of draws made so far
        #[must_use]
        pub fn draws_taken(&self) -> usize {
            *self.taken.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Number of scripted draws not yet consumed
        #[must_use]
        pub fn remaining(&self) -> usize {
            self.script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_f64(&self) -> f64 {
            *self.taken.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            self.script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(self.fallback)
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honours `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "critter=debug,critter_runtime=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::ScriptedRandom;
pub use reducer_test::{ReducerTest, assertions};
pub use storage_mocks::InMemoryStorage;
