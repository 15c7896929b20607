//! Domain types for the pet.
//!
//! [`PetState`] is the aggregate the engine owns. Its bounded counters are
//! [`Gauge`]s, which clamp on construction and on every arithmetic step, so
//! an out-of-range stat cannot be represented at all.

use crate::evolution::{self, Tier};
use serde::{Deserialize, Serialize};

/// Status strings written to [`PetState::message`]
pub mod messages {
    /// Fresh egg, before the first hatch
    pub const WAITING: &str = "waiting to hatch";
    /// Egg hatched into a child
    pub const HATCHED: &str = "hatched";
    /// A poop appeared
    pub const POOPED: &str = "pooped";
    /// Health or hunger reached zero
    pub const DIED: &str = "system failure";
    /// Feed
    pub const FED: &str = "yummy";
    /// Play
    pub const PLAYED: &str = "fun";
    /// Clean with poop present
    pub const CLEANED: &str = "cleaned";
    /// Clean with nothing to clean
    pub const ALREADY_CLEAN: &str = "already clean";
    /// Heal
    pub const HEALING: &str = "healing";
    /// Woke up
    pub const WOKE: &str = "good morning";
    /// Fell asleep
    pub const SLEPT: &str = "good night";
    /// Reset
    pub const NEW_SESSION: &str = "new session";
    /// Hatched pet restored from a snapshot
    pub const RESUMED: &str = "welcome back";
}

/// Integer counter clamped to `0..=MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gauge<const MAX: u8>(u8);

/// Hunger, happiness and health: `0..=100`
pub type Stat = Gauge<100>;

/// Droppings on screen: `0..=4`
pub type PoopCount = Gauge<4>;

impl<const MAX: u8> Gauge<MAX> {
    /// Gauge at zero
    pub const EMPTY: Self = Self(0);

    /// Gauge at its maximum
    pub const FULL: Self = Self(MAX);

    /// Build a gauge, clamping `value` into range
    #[must_use]
    pub fn new(value: i64) -> Self {
        // Clamped into 0..=MAX, which always fits in a u8.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(value.clamp(0, i64::from(MAX)) as u8)
    }

    /// Current value
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `min(MAX, value + amount)`
    #[must_use]
    pub fn raise(self, amount: u8) -> Self {
        Self(self.0.saturating_add(amount).min(MAX))
    }

    /// `max(0, value - amount)`
    #[must_use]
    pub const fn lower(self, amount: u8) -> Self {
        Self(self.0.saturating_sub(amount))
    }

    /// Whether the gauge is at zero
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl<const MAX: u8> Default for Gauge<MAX> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<const MAX: u8> PartialEq<u8> for Gauge<MAX> {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl<const MAX: u8> std::fmt::Display for Gauge<MAX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Life-cycle phase
///
/// Ordered: a pet only ever moves forward through
/// `Egg < Child < Adult < Dead`, except through an explicit reset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Waiting to hatch; no stats move
    #[default]
    Egg,
    /// Hatched; care mistakes are counted in this stage
    Child,
    /// Evolved; care quality is frozen into a [`Tier`]
    Adult,
    /// Terminal until reset
    Dead,
}

impl Stage {
    /// Hatched and alive: the only stages that tick stats or accept care
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Child | Self::Adult)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Egg => "egg",
            Self::Child => "child",
            Self::Adult => "adult",
            Self::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// Audio cue for the external sound collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    /// Short button blip
    Click,
    /// Rising arpeggio
    Eat,
    /// Major-chord jingle
    Happy,
    /// Low buzz (poop, death)
    Bad,
    /// Sweep (hatch, evolve, heal)
    Evolve,
}

/// Transient display tag that overrides the stage sprite while active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    /// After feed
    Eating,
    /// After play
    Playing,
    /// After a successful clean
    Cleaning,
    /// After a clean with nothing to clean
    Refuse,
    /// After heal
    Healing,
    /// After waking up
    Waking,
}

/// The pet aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetState {
    /// Life-cycle phase
    pub stage: Stage,
    /// 100 is full, 0 is starving
    pub hunger: Stat,
    /// 100 is delighted
    pub happiness: Stat,
    /// 0 is fatal
    pub health: Stat,
    /// Droppings not yet cleaned
    pub poop_count: PoopCount,
    /// Ticks lived since hatching
    pub age: u32,
    /// Only meaningful while [`Stage::is_active`]
    pub is_sleeping: bool,
    /// Neglect events counted during childhood
    pub care_mistakes: u32,
    /// Last status line
    pub message: String,
}

impl Default for PetState {
    fn default() -> Self {
        Self {
            stage: Stage::Egg,
            hunger: Stat::FULL,
            happiness: Stat::FULL,
            health: Stat::FULL,
            poop_count: PoopCount::EMPTY,
            age: 0,
            is_sleeping: false,
            care_mistakes: 0,
            message: messages::WAITING.to_string(),
        }
    }
}

impl PetState {
    /// Fresh egg with full stats
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether care actions (feed, play, clean, heal) are accepted
    #[must_use]
    pub const fn is_awake_and_active(&self) -> bool {
        self.stage.is_active() && !self.is_sleeping
    }

    /// Evolution tier, known once the pet is an adult
    ///
    /// Care mistakes stop accumulating after childhood, so the tier can be
    /// recomputed at any time instead of being stored.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        (self.stage == Stage::Adult).then(|| evolution::resolve(self.care_mistakes))
    }

    pub(crate) fn set_message(&mut self, message: &str) {
        message.clone_into(&mut self.message);
    }
}

/// The persisted subset of [`PetState`]
///
/// Field names follow the flat layout `stage, hunger, happiness, health,
/// poopCount, age, isSleeping, careMistakes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Life-cycle phase
    pub stage: Stage,
    /// Hunger stat
    pub hunger: u8,
    /// Happiness stat
    pub happiness: u8,
    /// Health stat
    pub health: u8,
    /// Droppings
    pub poop_count: u8,
    /// Age in ticks
    pub age: u32,
    /// Sleeping flag
    pub is_sleeping: bool,
    /// Childhood neglect counter
    pub care_mistakes: u32,
}

impl From<&PetState> for Snapshot {
    fn from(pet: &PetState) -> Self {
        Self {
            stage: pet.stage,
            hunger: pet.hunger.get(),
            happiness: pet.happiness.get(),
            health: pet.health.get(),
            poop_count: pet.poop_count.get(),
            age: pet.age,
            is_sleeping: pet.is_sleeping,
            care_mistakes: pet.care_mistakes,
        }
    }
}

/// Every input the pet reducer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetAction {
    /// Start the simulation clock (no-op when dead or already running)
    Start,
    /// Stop the simulation clock
    Stop,
    /// One clock firing; ignored unless `epoch` matches the running clock
    Tick {
        /// Clock generation that scheduled this firing
        epoch: u64,
    },
    /// +20 hunger, +2 health
    Feed,
    /// +15 happiness, -5 hunger
    Play,
    /// Remove all droppings
    Clean,
    /// +20 health
    Heal,
    /// Fall asleep or wake up
    ToggleSleep,
    /// Start over from a fresh egg
    Reset,
    /// Flip the audio-enable flag
    ToggleMute,
    /// Reaction timer elapsed; ignored unless `seq` is the latest trigger
    ReactionExpired {
        /// Trigger sequence number
        seq: u64,
    },
}
