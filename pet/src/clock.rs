//! The simulation clock.
//!
//! A fixed-delay scheduler expressed as effects: each committed tick
//! schedules the next one, so two firings never overlap. Every start bumps
//! an epoch carried by [`PetAction::Tick`]; a firing from an older epoch is
//! ignored even if it was already in flight when the clock stopped.

use crate::types::{PetAction, Stage};
use critter_core::{Effect, EffectId, cancellable_delay};
use std::time::Duration;

/// Id of the pending tick timer
pub const TICK_TIMER: EffectId = EffectId::new("pet.tick");

/// Whether ticks are being scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockStatus {
    /// No tick pending
    #[default]
    Stopped,
    /// A tick is pending
    Running,
}

/// Start/stop bookkeeping for the tick timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    status: ClockStatus,
    epoch: u64,
    interval: Duration,
}

impl SimulationClock {
    /// A stopped clock firing every `interval` once started
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            status: ClockStatus::Stopped,
            epoch: 0,
            interval,
        }
    }

    /// Begin ticking. No-op for a dead pet or a clock that is already running.
    pub fn start(&mut self, stage: Stage) -> Effect<PetAction> {
        if stage == Stage::Dead || self.is_running() {
            return Effect::None;
        }
        self.epoch += 1;
        self.status = ClockStatus::Running;
        tracing::debug!(epoch = self.epoch, "Simulation clock started");
        self.schedule_next()
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&mut self) -> Effect<PetAction> {
        if self.is_running() {
            tracing::debug!(epoch = self.epoch, "Simulation clock stopped");
        }
        self.status = ClockStatus::Stopped;
        self.epoch += 1;
        Effect::Cancel(TICK_TIMER)
    }

    /// Stop any existing run and start a fresh one
    pub fn restart(&mut self, stage: Stage) -> Effect<PetAction> {
        let stop = self.stop();
        let start = self.start(stage);
        Effect::merge(vec![stop, start])
    }

    /// Whether a firing from `epoch` belongs to the current run
    #[must_use]
    pub const fn accepts(&self, epoch: u64) -> bool {
        self.is_running() && self.epoch == epoch
    }

    /// Timer for the next firing of the current run
    #[must_use]
    pub fn schedule_next(&self) -> Effect<PetAction> {
        cancellable_delay! {
            id: TICK_TIMER,
            duration: self.interval,
            action: PetAction::Tick { epoch: self.epoch }
        }
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> ClockStatus {
        self.status
    }

    /// Whether a tick is pending
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.status, ClockStatus::Running)
    }

    /// Generation of the current (or last) run
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Time between firings
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}
