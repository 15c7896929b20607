//! Reducer for the pet engine.
//!
//! Every input, user intent or timer firing, is one [`PetAction`] reduced
//! against [`EngineState`] under the store's write lock. Care actions are
//! guarded: while disallowed they are silent no-ops. Any action that changes
//! the persisted [`Snapshot`] is followed by a revision-tagged save.

use crate::clock::SimulationClock;
use crate::config::PetConfig;
use crate::persistence::SnapshotAdapter;
use crate::reaction::ReactionEmitter;
use crate::sound::{SoundPlayer, TracingSoundPlayer};
use crate::transition::{self, TickEvent};
use crate::types::{PetAction, PetState, PoopCount, Reaction, Snapshot, Sound, messages};
use critter_core::{Effect, RandomSource, Reducer, SmallVec, Storage, async_effect, smallvec};
use critter_runtime::StdRandom;
use std::sync::Arc;
use std::time::Duration;

const FEED_HUNGER: u8 = 20;
const FEED_HEALTH: u8 = 2;
const PLAY_HAPPINESS: u8 = 15;
const PLAY_HUNGER: u8 = 5;
const HEAL_HEALTH: u8 = 20;

/// Environment dependencies for the pet reducer
#[derive(Clone)]
pub struct PetEnvironment {
    /// Draws for hatching, care mistakes and poop
    pub random: Arc<dyn RandomSource>,
    /// Snapshot load/save/clear
    pub persistence: Arc<SnapshotAdapter>,
    /// Audio cues
    pub sound: Arc<dyn SoundPlayer>,
    /// Timings and storage key
    pub config: PetConfig,
}

impl PetEnvironment {
    /// Creates a new `PetEnvironment`, persisting under `config.storage_key`
    #[must_use]
    pub fn new(
        random: Arc<dyn RandomSource>,
        storage: Arc<dyn Storage>,
        sound: Arc<dyn SoundPlayer>,
        config: PetConfig,
    ) -> Self {
        let persistence = Arc::new(SnapshotAdapter::new(storage, config.storage_key.clone()));
        Self {
            random,
            persistence,
            sound,
            config,
        }
    }

    /// Entropy-seeded randomness and a logging sound player over `storage`
    #[must_use]
    pub fn live(storage: Arc<dyn Storage>, config: PetConfig) -> Self {
        Self::new(
            Arc::new(StdRandom::from_entropy()),
            storage,
            Arc::new(TracingSoundPlayer::new()),
            config,
        )
    }
}

/// Everything the engine owns: the pet plus its transient companions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    /// The pet aggregate
    pub pet: PetState,
    /// Transient display tag
    pub reaction: ReactionEmitter,
    /// Tick scheduler bookkeeping
    pub clock: SimulationClock,
    /// Audio disabled
    pub muted: bool,
    /// Bumped on every persisted change and on reset
    pub revision: u64,
}

impl EngineState {
    /// Engine state around `pet`, with the clock stopped
    #[must_use]
    pub const fn new(pet: PetState, config: &PetConfig) -> Self {
        Self {
            pet,
            reaction: ReactionEmitter::new(),
            clock: SimulationClock::new(config.tick_interval),
            muted: false,
            revision: 0,
        }
    }
}

/// Reducer for the pet engine
#[derive(Clone, Copy, Debug, Default)]
pub struct PetReducer;

impl PetReducer {
    /// Creates a new `PetReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Fire-and-forget audio cue; nothing while muted
    fn play(state: &EngineState, env: &PetEnvironment, sound: Sound) -> Option<Effect<PetAction>> {
        if state.muted {
            return None;
        }
        let player = Arc::clone(&env.sound);
        Some(async_effect! {
            player.play(sound);
            None
        })
    }

    /// Show a reaction and play its cue
    fn respond(
        state: &mut EngineState,
        env: &PetEnvironment,
        reaction: Reaction,
        duration: Duration,
        sound: Option<Sound>,
    ) -> SmallVec<[Effect<PetAction>; 4]> {
        let mut effects = smallvec![state.reaction.trigger(reaction, duration)];
        if let Some(sound) = sound {
            effects.extend(Self::play(state, env, sound));
        }
        effects
    }

    /// Persist the current snapshot under a fresh revision
    fn save(state: &mut EngineState, env: &PetEnvironment) -> Effect<PetAction> {
        state.revision += 1;
        let revision = state.revision;
        let snapshot = Snapshot::from(&state.pet);
        let persistence = Arc::clone(&env.persistence);
        async_effect! {
            persistence.save(revision, snapshot).await;
            None
        }
    }

    /// Guard for feed/play/clean/heal
    fn care_allowed(state: &EngineState, action: PetAction) -> bool {
        let allowed = state.pet.is_awake_and_active();
        if !allowed {
            tracing::debug!(
                ?action,
                stage = %state.pet.stage,
                sleeping = state.pet.is_sleeping,
                "Ignoring care action"
            );
        }
        allowed
    }

    fn tick(
        state: &mut EngineState,
        env: &PetEnvironment,
        epoch: u64,
    ) -> SmallVec<[Effect<PetAction>; 4]> {
        if !state.clock.accepts(epoch) {
            tracing::trace!(epoch, current = state.clock.epoch(), "Ignoring stale tick");
            return SmallVec::new();
        }

        let outcome = transition::transition(&state.pet, env.random.as_ref());
        for event in &outcome.events {
            match event {
                TickEvent::Hatched => tracing::info!("Egg hatched"),
                TickEvent::Evolved(tier) => {
                    tracing::info!(?tier, care_mistakes = outcome.state.care_mistakes, "Pet evolved");
                },
                TickEvent::Died => {
                    tracing::info!(age = outcome.state.age, "Pet died");
                },
                TickEvent::CareMistake => {
                    tracing::debug!(care_mistakes = outcome.state.care_mistakes, "Care mistake");
                },
                TickEvent::Pooped => tracing::debug!("Pooped"),
            }
        }

        let died = outcome.is_dead();
        state.pet = outcome.state;

        let mut effects: SmallVec<[Effect<PetAction>; 4]> = SmallVec::new();
        if let Some(sound) = outcome.sound {
            effects.extend(Self::play(state, env, sound));
        }
        effects.push(if died {
            state.clock.stop()
        } else {
            state.clock.schedule_next()
        });
        effects
    }

    fn reset(state: &mut EngineState, env: &PetEnvironment) -> SmallVec<[Effect<PetAction>; 4]> {
        tracing::info!("Starting a new session");
        state.revision += 1;
        let revision = state.revision;

        let cancel_reaction = state.reaction.cancel();
        state.pet = PetState::new();
        state.pet.set_message(messages::NEW_SESSION);
        let restart = state.clock.restart(state.pet.stage);

        let persistence = Arc::clone(&env.persistence);
        smallvec![
            cancel_reaction,
            restart,
            async_effect! {
                persistence.clear(revision).await;
                None
            },
        ]
    }
}

impl Reducer for PetReducer {
    type State = EngineState;
    type Action = PetAction;
    type Environment = PetEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let before = Snapshot::from(&state.pet);
        let config = &env.config;

        let mut effects: SmallVec<[Effect<PetAction>; 4]> = match action {
            PetAction::Start => smallvec![state.clock.start(state.pet.stage)],
            PetAction::Stop => smallvec![state.clock.stop()],
            PetAction::Tick { epoch } => Self::tick(state, env, epoch),

            PetAction::Feed => {
                if !Self::care_allowed(state, action) {
                    return smallvec![Effect::None];
                }
                let pet = &mut state.pet;
                pet.hunger = pet.hunger.raise(FEED_HUNGER);
                pet.health = pet.health.raise(FEED_HEALTH);
                pet.set_message(messages::FED);
                Self::respond(state, env, Reaction::Eating, config.reaction_duration, Some(Sound::Eat))
            },

            PetAction::Play => {
                if !Self::care_allowed(state, action) {
                    return smallvec![Effect::None];
                }
                let pet = &mut state.pet;
                pet.happiness = pet.happiness.raise(PLAY_HAPPINESS);
                pet.hunger = pet.hunger.lower(PLAY_HUNGER);
                pet.set_message(messages::PLAYED);
                Self::respond(state, env, Reaction::Playing, config.reaction_duration, Some(Sound::Happy))
            },

            PetAction::Clean => {
                if !Self::care_allowed(state, action) {
                    return smallvec![Effect::None];
                }
                if state.pet.poop_count.is_empty() {
                    state.pet.set_message(messages::ALREADY_CLEAN);
                    Self::respond(state, env, Reaction::Refuse, config.reaction_duration, None)
                } else {
                    state.pet.poop_count = PoopCount::EMPTY;
                    state.pet.set_message(messages::CLEANED);
                    Self::respond(state, env, Reaction::Cleaning, config.reaction_duration, Some(Sound::Click))
                }
            },

            PetAction::Heal => {
                if !Self::care_allowed(state, action) {
                    return smallvec![Effect::None];
                }
                let pet = &mut state.pet;
                pet.health = pet.health.raise(HEAL_HEALTH);
                pet.set_message(messages::HEALING);
                Self::respond(state, env, Reaction::Healing, config.reaction_duration, Some(Sound::Evolve))
            },

            PetAction::ToggleSleep => {
                if !state.pet.stage.is_active() {
                    tracing::debug!(stage = %state.pet.stage, "Ignoring sleep toggle");
                    return smallvec![Effect::None];
                }
                state.pet.is_sleeping = !state.pet.is_sleeping;
                if state.pet.is_sleeping {
                    state.pet.set_message(messages::SLEPT);
                    SmallVec::new()
                } else {
                    state.pet.set_message(messages::WOKE);
                    Self::respond(state, env, Reaction::Waking, config.wake_reaction_duration, None)
                }
            },

            PetAction::Reset => return Self::reset(state, env),

            PetAction::ToggleMute => {
                state.muted = !state.muted;
                tracing::debug!(muted = state.muted, "Toggled mute");
                let player = Arc::clone(&env.sound);
                let enabled = !state.muted;
                smallvec![async_effect! {
                    player.set_enabled(enabled);
                    None
                }]
            },

            PetAction::ReactionExpired { seq } => {
                state.reaction.expire(seq);
                SmallVec::new()
            },
        };

        if Snapshot::from(&state.pet) != before {
            effects.push(Self::save(state, env));
        }
        if effects.is_empty() {
            effects.push(Effect::None);
        }
        effects
    }
}
