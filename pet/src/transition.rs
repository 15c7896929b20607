//! The tick transition function.
//!
//! One clock firing maps the committed [`PetState`] and a handful of random
//! draws to the next state. Steps run in a fixed order (decay, health,
//! poop, age, evolution, death) because reordering them changes which tick
//! a pet can die or evolve on.

use crate::evolution::{self, Tier};
use crate::types::{PetState, Sound, Stage, messages};
use critter_core::RandomSource;

/// An egg hatches when its draw exceeds this
pub const HATCH_THRESHOLD: f64 = 0.7;

/// A childhood health loss counts as a care mistake when its draw exceeds this
pub const CARE_MISTAKE_THRESHOLD: f64 = 0.8;

/// A well-fed pet poops when its draw exceeds this
pub const POOP_THRESHOLD: f64 = 0.9;

/// A child evolves once its age exceeds this
pub const EVOLUTION_AGE: u32 = 50;

/// Hunger below this (or too much poop) costs health
pub const STARVING_BELOW: u8 = 20;

/// Poop above this costs health
pub const FILTHY_ABOVE: u8 = 2;

/// Hunger above this (with no poop) regenerates health
pub const WELL_FED_ABOVE: u8 = 80;

/// Hunger above this makes a poop possible
pub const POOP_HUNGER_ABOVE: u8 = 50;

const AWAKE_DECAY: u8 = 2;
const NEGLECT_DAMAGE: u8 = 5;
const REGENERATION: u8 = 1;

/// Something notable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Egg became a child
    Hatched,
    /// A childhood health loss was counted against the owner
    CareMistake,
    /// A new dropping appeared
    Pooped,
    /// Child became an adult of the given tier
    Evolved(Tier),
    /// Health or hunger reached zero
    Died,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// State to commit
    pub state: PetState,
    /// Cue for the sound collaborator, from the last event that set one
    pub sound: Option<Sound>,
    /// Events in the order they happened
    pub events: Vec<TickEvent>,
}

impl TickOutcome {
    fn unchanged(state: &PetState) -> Self {
        Self {
            state: state.clone(),
            sound: None,
            events: Vec::new(),
        }
    }

    fn record(&mut self, event: TickEvent, message: &str, sound: Sound) {
        self.events.push(event);
        self.state.set_message(message);
        self.sound = Some(sound);
    }

    /// Whether the pet died on this tick; the clock must halt
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.events.contains(&TickEvent::Died)
    }
}

/// Advance the pet by one tick.
///
/// Deterministic given the draws `random` returns. A dead pet is returned
/// unchanged. The message is only overwritten when an event happens.
pub fn transition(state: &PetState, random: &dyn RandomSource) -> TickOutcome {
    let mut outcome = TickOutcome::unchanged(state);

    match state.stage {
        Stage::Dead => return outcome,
        Stage::Egg => {
            if random.next_f64() > HATCH_THRESHOLD {
                outcome.state.stage = Stage::Child;
                outcome.record(TickEvent::Hatched, messages::HATCHED, Sound::Evolve);
            }
            return outcome;
        },
        Stage::Child | Stage::Adult => {},
    }

    if outcome.state.is_sleeping {
        let pet = &mut outcome.state;
        pet.health = pet.health.raise(REGENERATION);
    } else {
        awake_step(&mut outcome, random);
    }

    outcome.state.age = outcome.state.age.saturating_add(1);

    if outcome.state.stage == Stage::Child && outcome.state.age > EVOLUTION_AGE {
        let tier = evolution::resolve(outcome.state.care_mistakes);
        outcome.state.stage = Stage::Adult;
        outcome.record(TickEvent::Evolved(tier), tier.evolution_message(), Sound::Evolve);
    }

    if outcome.state.health.is_empty() || outcome.state.hunger.is_empty() {
        outcome.state.stage = Stage::Dead;
        outcome.state.is_sleeping = false;
        outcome.record(TickEvent::Died, messages::DIED, Sound::Bad);
    }

    outcome
}

/// Decay, health adjustment and the poop roll for an awake pet
fn awake_step(outcome: &mut TickOutcome, random: &dyn RandomSource) {
    let pet = &mut outcome.state;
    pet.hunger = pet.hunger.lower(AWAKE_DECAY);
    pet.happiness = pet.happiness.lower(AWAKE_DECAY);

    if pet.hunger.get() < STARVING_BELOW || pet.poop_count.get() > FILTHY_ABOVE {
        let damaged = pet.health.lower(NEGLECT_DAMAGE);
        // Every real loss consumes a draw; only a child's can count.
        if damaged < pet.health {
            let draw = random.next_f64();
            if pet.stage == Stage::Child && draw > CARE_MISTAKE_THRESHOLD {
                pet.care_mistakes = pet.care_mistakes.saturating_add(1);
                outcome.events.push(TickEvent::CareMistake);
            }
        }
        pet.health = damaged;
    } else if pet.hunger.get() > WELL_FED_ABOVE && pet.poop_count.is_empty() {
        pet.health = pet.health.raise(REGENERATION);
    }

    if pet.hunger.get() > POOP_HUNGER_ABOVE && random.next_f64() > POOP_THRESHOLD {
        pet.poop_count = pet.poop_count.raise(1);
        outcome.record(TickEvent::Pooped, messages::POOPED, Sound::Bad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PoopCount, Stat};
    use critter_testing::ScriptedRandom;

    fn child() -> PetState {
        PetState {
            stage: Stage::Child,
            message: messages::HATCHED.to_string(),
            ..PetState::default()
        }
    }

    #[test]
    fn dead_pet_is_left_alone() {
        let pet = PetState {
            stage: Stage::Dead,
            ..PetState::default()
        };
        let random = ScriptedRandom::constant(0.99);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state, pet);
        assert_eq!(random.draws_taken(), 0);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn egg_hatches_on_a_high_draw() {
        let outcome = transition(&PetState::new(), &ScriptedRandom::new([0.71]));

        assert_eq!(outcome.state.stage, Stage::Child);
        assert_eq!(outcome.state.message, messages::HATCHED);
        assert_eq!(outcome.sound, Some(Sound::Evolve));
        assert_eq!(outcome.events, vec![TickEvent::Hatched]);
    }

    #[test]
    fn egg_stays_put_on_a_low_draw() {
        let egg = PetState::new();
        let outcome = transition(&egg, &ScriptedRandom::new([0.7]));

        assert_eq!(outcome.state, egg);
        assert_eq!(outcome.sound, None);
    }

    #[test]
    fn egg_stats_and_age_never_move() {
        let egg = PetState {
            hunger: Stat::new(10),
            ..PetState::new()
        };
        let outcome = transition(&egg, &ScriptedRandom::new([0.95]));

        assert_eq!(outcome.state.hunger, 10);
        assert_eq!(outcome.state.age, 0);
    }

    #[test]
    fn awake_child_decays() {
        let pet = PetState {
            hunger: Stat::new(60),
            happiness: Stat::new(60),
            health: Stat::new(60),
            ..child()
        };
        let random = ScriptedRandom::new([0.0]);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state.hunger, 58);
        assert_eq!(outcome.state.happiness, 58);
        assert_eq!(outcome.state.health, 60);
        assert_eq!(outcome.state.age, 1);
        // only the poop roll was drawn
        assert_eq!(random.draws_taken(), 1);
        assert_eq!(outcome.state.message, messages::HATCHED);
    }

    #[test]
    fn well_fed_clean_pet_regenerates() {
        let pet = PetState {
            health: Stat::new(50),
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

        assert_eq!(outcome.state.hunger, 98);
        assert_eq!(outcome.state.health, 51);
    }

    #[test]
    fn starving_child_loses_health_and_may_count_a_mistake() {
        let pet = PetState {
            hunger: Stat::new(15),
            health: Stat::new(50),
            ..child()
        };

        let lucky = transition(&pet, &ScriptedRandom::new([0.8]));
        assert_eq!(lucky.state.health, 45);
        assert_eq!(lucky.state.care_mistakes, 0);

        let unlucky = transition(&pet, &ScriptedRandom::new([0.81]));
        assert_eq!(unlucky.state.health, 45);
        assert_eq!(unlucky.state.care_mistakes, 1);
        assert!(unlucky.events.contains(&TickEvent::CareMistake));
    }

    #[test]
    fn filth_costs_health_even_when_fed() {
        let pet = PetState {
            poop_count: PoopCount::new(3),
            health: Stat::new(50),
            ..child()
        };
        // mistake roll, then poop roll
        let random = ScriptedRandom::new([0.0, 0.0]);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state.health, 45);
        assert_eq!(random.draws_taken(), 2);
    }

    #[test]
    fn no_mistake_roll_without_actual_loss() {
        let pet = PetState {
            hunger: Stat::new(30),
            poop_count: PoopCount::new(3),
            health: Stat::EMPTY,
            ..child()
        };
        let random = ScriptedRandom::constant(0.99);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state.care_mistakes, 0);
        assert_eq!(random.draws_taken(), 0);
    }

    #[test]
    fn adults_never_accumulate_mistakes() {
        let pet = PetState {
            stage: Stage::Adult,
            hunger: Stat::new(15),
            ..child()
        };
        let random = ScriptedRandom::constant(0.99);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state.care_mistakes, 0);
        assert_eq!(outcome.state.health, 95);
        assert_eq!(random.draws_taken(), 1);
    }

    #[test]
    fn adult_health_loss_consumes_the_mistake_draw() {
        let pet = PetState {
            stage: Stage::Adult,
            hunger: Stat::new(60),
            health: Stat::new(50),
            poop_count: PoopCount::new(3),
            ..child()
        };
        let random = ScriptedRandom::new([0.95, 0.0]);

        let outcome = transition(&pet, &random);

        assert_eq!(random.draws_taken(), 2);
        assert_eq!(outcome.state.care_mistakes, 0);
        assert_eq!(outcome.state.health, 45);
        assert_eq!(outcome.state.poop_count, 3);
        assert!(!outcome.events.contains(&TickEvent::Pooped));
        assert_eq!(outcome.state.message, messages::HATCHED);
    }

    #[test]
    fn well_fed_pet_may_poop() {
        let outcome = transition(&child(), &ScriptedRandom::new([0.91]));

        assert_eq!(outcome.state.poop_count, 1);
        assert_eq!(outcome.state.message, messages::POOPED);
        assert_eq!(outcome.sound, Some(Sound::Bad));
    }

    #[test]
    fn poop_saturates_at_four() {
        let pet = PetState {
            poop_count: PoopCount::FULL,
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([0.0, 0.95]));

        assert_eq!(outcome.state.poop_count, 4);
    }

    #[test]
    fn sleeping_pet_only_heals() {
        let pet = PetState {
            is_sleeping: true,
            hunger: Stat::new(70),
            happiness: Stat::new(40),
            health: Stat::new(80),
            poop_count: PoopCount::new(1),
            ..child()
        };
        let random = ScriptedRandom::constant(0.99);

        let outcome = transition(&pet, &random);

        assert_eq!(outcome.state.hunger, 70);
        assert_eq!(outcome.state.happiness, 40);
        assert_eq!(outcome.state.poop_count, 1);
        assert_eq!(outcome.state.health, 81);
        assert_eq!(outcome.state.age, 1);
        assert_ne!(outcome.state.message, messages::POOPED);
        assert_eq!(random.draws_taken(), 0);
    }

    #[test]
    fn child_evolves_after_fifty_ticks() {
        for (mistakes, tier) in [(0, Tier::Good), (5, Tier::Neutral), (9, Tier::Bad)] {
            let pet = PetState {
                age: EVOLUTION_AGE,
                care_mistakes: mistakes,
                ..child()
            };

            let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

            assert_eq!(outcome.state.stage, Stage::Adult);
            assert_eq!(outcome.state.message, tier.evolution_message());
            assert_eq!(outcome.state.tier(), Some(tier));
            assert_eq!(outcome.sound, Some(Sound::Evolve));
        }
    }

    #[test]
    fn sleeping_child_still_evolves() {
        let pet = PetState {
            age: EVOLUTION_AGE,
            is_sleeping: true,
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([]));

        assert_eq!(outcome.state.stage, Stage::Adult);
    }

    #[test]
    fn no_evolution_at_exactly_fifty() {
        let pet = PetState {
            age: EVOLUTION_AGE - 1,
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

        assert_eq!(outcome.state.age, EVOLUTION_AGE);
        assert_eq!(outcome.state.stage, Stage::Child);
    }

    #[test]
    fn starving_low_health_pet_dies_within_the_tick() {
        let pet = PetState {
            hunger: Stat::new(10),
            health: Stat::new(3),
            ..child()
        };

        let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

        assert_eq!(outcome.state.health, 0);
        assert_eq!(outcome.state.stage, Stage::Dead);
        assert_eq!(outcome.state.message, messages::DIED);
        assert_eq!(outcome.sound, Some(Sound::Bad));
        assert!(outcome.is_dead());
    }

    #[test]
    fn empty_hunger_is_fatal() {
        let pet = PetState {
            hunger: Stat::new(2),
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

        assert_eq!(outcome.state.hunger, 0);
        assert_eq!(outcome.state.stage, Stage::Dead);
    }

    #[test]
    fn death_wins_over_evolution_on_the_same_tick() {
        let pet = PetState {
            age: EVOLUTION_AGE,
            hunger: Stat::new(2),
            ..child()
        };
        let outcome = transition(&pet, &ScriptedRandom::new([0.0]));

        assert_eq!(outcome.state.stage, Stage::Dead);
        assert_eq!(
            outcome.events,
            vec![TickEvent::Evolved(Tier::Good), TickEvent::Died]
        );
    }
}
