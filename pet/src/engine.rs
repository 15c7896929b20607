//! The engine facade consumed by a presentation layer.
//!
//! [`PetEngine`] owns a [`Store`] running the [`PetReducer`]. Ticks, reaction
//! expiries and user actions all commit through the store's single write
//! path, so a reader never sees a half-applied step.

use crate::clock::ClockStatus;
use crate::config::ConfigError;
use crate::evolution::Tier;
use crate::reducer::{EngineState, PetEnvironment, PetReducer};
use crate::types::{PetAction, PetState, Reaction, Stage};
use critter_runtime::{EffectHandle, Store, StoreConfig, StoreError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised while booting the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configuration was rejected before any timer was armed
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The store refused the start action
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Store specialised to the pet engine
pub type PetStore = Store<EngineState, PetAction, PetEnvironment, PetReducer>;

/// What the presentation layer should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    /// An active reaction overrides the stage sprite
    Reaction(Reaction),
    /// Stage sprite; adults carry their tier
    Stage(Stage, Option<Tier>),
}

/// Read-only view of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetView {
    /// Committed pet state
    pub pet: PetState,
    /// Active reaction tag
    pub reaction: Option<Reaction>,
    /// Audio disabled
    pub muted: bool,
    /// Evolution tier, for adults
    pub tier: Option<Tier>,
    /// Whether ticks are being scheduled
    pub clock_running: bool,
}

impl PetView {
    /// Capture the view of `state`
    #[must_use]
    pub fn of(state: &EngineState) -> Self {
        Self {
            pet: state.pet.clone(),
            reaction: state.reaction.active(),
            muted: state.muted,
            tier: state.pet.tier(),
            clock_running: state.clock.status() == ClockStatus::Running,
        }
    }

    /// Presentation key: the active reaction if any, otherwise the stage
    #[must_use]
    pub const fn sprite(&self) -> Sprite {
        match self.reaction {
            Some(reaction) => Sprite::Reaction(reaction),
            None => Sprite::Stage(self.pet.stage, self.tier),
        }
    }
}

/// A running virtual pet
#[derive(Clone)]
pub struct PetEngine {
    store: PetStore,
}

impl PetEngine {
    /// Load the persisted pet (or a fresh egg) and start the clock
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the configuration fails
    /// [`PetConfig::validate`](crate::config::PetConfig::validate), and
    /// [`EngineError::Store`] if the store refuses the start action.
    pub async fn boot(env: PetEnvironment) -> Result<Self, EngineError> {
        Self::boot_with_config(env, StoreConfig::default()).await
    }

    /// Like [`PetEngine::boot`], with explicit store settings
    ///
    /// # Errors
    ///
    /// See [`PetEngine::boot`].
    pub async fn boot_with_config(
        env: PetEnvironment,
        store_config: StoreConfig,
    ) -> Result<Self, EngineError> {
        env.config.validate()?;
        let pet = env.persistence.load().await;
        let state = EngineState::new(pet, &env.config);
        let store = Store::with_config(state, PetReducer::new(), env, store_config);
        store.send(PetAction::Start).await?;
        Ok(Self { store })
    }

    /// Snapshot of everything a presentation layer needs
    pub async fn view(&self) -> PetView {
        self.store.state(PetView::of).await
    }

    /// Committed pet state
    pub async fn pet(&self) -> PetState {
        self.store.state(|state| state.pet.clone()).await
    }

    /// Reduce one action
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn dispatch(&self, action: PetAction) -> Result<EffectHandle, StoreError> {
        tracing::debug!(?action, "Dispatching");
        self.store.send(action).await
    }

    /// +20 hunger, +2 health
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn feed(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::Feed).await
    }

    /// +15 happiness, -5 hunger
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn play(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::Play).await
    }

    /// Remove all droppings
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn clean(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::Clean).await
    }

    /// +20 health
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn heal(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::Heal).await
    }

    /// Fall asleep or wake up
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn toggle_sleep(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::ToggleSleep).await
    }

    /// Start over from a fresh egg
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn reset(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::Reset).await
    }

    /// Flip the audio-enable flag
    ///
    /// # Errors
    ///
    /// See [`PetEngine::dispatch`].
    pub async fn toggle_mute(&self) -> Result<EffectHandle, StoreError> {
        self.dispatch(PetAction::ToggleMute).await
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &PetStore {
        &self.store
    }

    /// Actions produced by timers and effects, as they are fed back
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PetAction> {
        self.store.subscribe_actions()
    }

    /// Stop the clock and wait for outstanding saves
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.stop_clock().await;
        self.store.shutdown(timeout).await
    }

    /// Like [`PetEngine::shutdown`], bounded by the store's configured
    /// shutdown timeout
    ///
    /// # Errors
    ///
    /// See [`PetEngine::shutdown`].
    pub async fn close(&self) -> Result<(), StoreError> {
        self.stop_clock().await;
        self.store.shutdown_default().await
    }

    async fn stop_clock(&self) {
        if let Err(error) = self.store.send(PetAction::Stop).await {
            tracing::debug!(%error, "Clock already stopped");
        }
    }
}

impl std::fmt::Debug for PetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PetConfig;
    use crate::types::Stat;

    fn state(pet: PetState) -> EngineState {
        EngineState::new(pet, &PetConfig::default())
    }

    #[test]
    fn active_reaction_overrides_the_stage_sprite() {
        let mut engine_state = state(PetState {
            stage: Stage::Child,
            ..PetState::new()
        });
        let _ = engine_state
            .reaction
            .trigger(Reaction::Eating, Duration::from_millis(1500));

        assert_eq!(PetView::of(&engine_state).sprite(), Sprite::Reaction(Reaction::Eating));

        assert!(engine_state.reaction.expire(1));
        assert_eq!(
            PetView::of(&engine_state).sprite(),
            Sprite::Stage(Stage::Child, None)
        );
    }

    #[test]
    fn adult_sprite_carries_the_tier() {
        let view = PetView::of(&state(PetState {
            stage: Stage::Adult,
            care_mistakes: 9,
            health: Stat::new(40),
            ..PetState::new()
        }));

        assert_eq!(view.tier, Some(Tier::Bad));
        assert_eq!(view.sprite(), Sprite::Stage(Stage::Adult, Some(Tier::Bad)));
        assert!(!view.clock_running);
    }
}
