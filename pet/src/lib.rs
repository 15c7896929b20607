//! # Critter
//!
//! A virtual pet that hatches, grows up and, if neglected, dies.
//!
//! The pet moves through `egg → child → adult → dead`. A simulation clock
//! fires a tick every two seconds; each tick decays stats, rolls for random
//! events, and counts care mistakes during childhood. The number of care
//! mistakes decides the adult's tier. Care actions (feed, play, clean, heal,
//! sleep) mutate the pet between ticks, and everything commits through one
//! [`critter_runtime::Store`].
//!
//! ## Example
//!
//! ```no_run
//! use critter::{PetConfig, PetEngine, PetEnvironment};
//! use critter_runtime::FileStorage;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PetConfig::from_env()?;
//! let storage = Arc::new(FileStorage::new("./saves"));
//! let engine = PetEngine::boot(PetEnvironment::live(storage, config)).await?;
//!
//! engine.feed().await?;
//! let view = engine.view().await;
//! println!("{} {:?}", view.pet.message, view.sprite());
//!
//! engine.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod evolution;
pub mod persistence;
pub mod reaction;
pub mod reducer;
pub mod sound;
pub mod transition;
pub mod types;

// Re-export commonly used types
pub use clock::{ClockStatus, SimulationClock, TICK_TIMER};
pub use config::{ConfigError, PetConfig};
pub use engine::{EngineError, PetEngine, PetStore, PetView, Sprite};
pub use evolution::Tier;
pub use persistence::SnapshotAdapter;
pub use reaction::{REACTION_TIMER, ReactionEmitter};
pub use reducer::{EngineState, PetEnvironment, PetReducer};
pub use sound::{RecordingSoundPlayer, SoundPlayer, TracingSoundPlayer};
pub use transition::{TickEvent, TickOutcome, transition};
pub use types::{PetAction, PetState, PoopCount, Reaction, Snapshot, Sound, Stage, Stat};
