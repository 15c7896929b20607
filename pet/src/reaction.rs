//! Transient reaction tag with a single expiry timer.

use crate::types::{PetAction, Reaction};
use critter_core::{Effect, EffectId, cancellable_delay};
use std::time::Duration;

/// Id of the pending reaction expiry
pub const REACTION_TIMER: EffectId = EffectId::new("pet.reaction");

/// At most one active reaction; the last trigger wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionEmitter {
    active: Option<Reaction>,
    seq: u64,
}

impl ReactionEmitter {
    /// No active reaction
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            seq: 0,
        }
    }

    /// Show `reaction` for `duration`, replacing whatever was showing
    pub fn trigger(&mut self, reaction: Reaction, duration: Duration) -> Effect<PetAction> {
        self.seq += 1;
        self.active = Some(reaction);
        cancellable_delay! {
            id: REACTION_TIMER,
            duration: duration,
            action: PetAction::ReactionExpired { seq: self.seq }
        }
    }

    /// Clear the tag if `seq` is the latest trigger.
    ///
    /// Returns whether anything changed.
    pub fn expire(&mut self, seq: u64) -> bool {
        if seq != self.seq || self.active.is_none() {
            return false;
        }
        self.active = None;
        true
    }

    /// Drop the active tag and its pending expiry
    pub fn cancel(&mut self) -> Effect<PetAction> {
        self.seq += 1;
        self.active = None;
        Effect::Cancel(REACTION_TIMER)
    }

    /// Tag currently showing
    #[must_use]
    pub const fn active(&self) -> Option<Reaction> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critter_testing::assertions;

    const SHORT: Duration = Duration::from_millis(1500);

    #[test]
    fn trigger_shows_the_tag_and_schedules_expiry() {
        let mut emitter = ReactionEmitter::new();

        let effect = emitter.trigger(Reaction::Eating, SHORT);

        assert_eq!(emitter.active(), Some(Reaction::Eating));
        assert_eq!(
            assertions::scheduled_action(&[effect], REACTION_TIMER),
            Some(PetAction::ReactionExpired { seq: 1 })
        );
    }

    #[test]
    fn last_trigger_wins() {
        let mut emitter = ReactionEmitter::new();
        let _ = emitter.trigger(Reaction::Eating, SHORT);
        let _ = emitter.trigger(Reaction::Playing, SHORT);

        assert!(!emitter.expire(1));
        assert_eq!(emitter.active(), Some(Reaction::Playing));

        assert!(emitter.expire(2));
        assert_eq!(emitter.active(), None);
    }

    #[test]
    fn cancel_clears_and_invalidates_pending_expiry() {
        let mut emitter = ReactionEmitter::new();
        let _ = emitter.trigger(Reaction::Healing, SHORT);

        let effect = emitter.cancel();

        assertions::assert_cancels(&[effect], REACTION_TIMER);
        assert_eq!(emitter.active(), None);
        assert!(!emitter.expire(1));
    }
}
