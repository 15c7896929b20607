//! Sound collaborator.
//!
//! The engine only decides *which* cue to play; synthesis lives behind
//! [`SoundPlayer`]. Muting is forwarded as [`SoundPlayer::set_enabled`].

use crate::types::Sound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Plays audio cues
pub trait SoundPlayer: Send + Sync {
    /// Play `sound` if enabled
    fn play(&self, sound: Sound);

    /// Turn playback on or off
    fn set_enabled(&self, enabled: bool);
}

/// Player that logs each cue through `tracing`
#[derive(Debug)]
pub struct TracingSoundPlayer {
    enabled: AtomicBool,
}

impl TracingSoundPlayer {
    /// Enabled player
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl Default for TracingSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPlayer for TracingSoundPlayer {
    fn play(&self, sound: Sound) {
        if self.enabled.load(Ordering::Acquire) {
            tracing::debug!(?sound, "Playing sound");
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

/// Player that records every audible cue
#[derive(Debug)]
pub struct RecordingSoundPlayer {
    enabled: AtomicBool,
    played: Mutex<Vec<Sound>>,
}

impl RecordingSoundPlayer {
    /// Enabled player with nothing recorded
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            played: Mutex::new(Vec::new()),
        }
    }

    /// Cues played so far, oldest first
    #[must_use]
    pub fn played(&self) -> Vec<Sound> {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether playback is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for RecordingSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPlayer for RecordingSoundPlayer {
    fn play(&self, sound: Sound) {
        if self.is_enabled() {
            self.played
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(sound);
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}
