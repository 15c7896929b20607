//! Engine configuration.
//!
//! Timings and the storage key, with defaults matching the classic device:
//! a tick every two seconds and reactions that linger for a second and a
//! half. Values can be overridden from `PET_*` environment variables.

use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`PetConfig::tick_interval`] (milliseconds)
pub const TICK_INTERVAL_VAR: &str = "PET_TICK_INTERVAL_MS";

/// Environment variable overriding [`PetConfig::reaction_duration`] (milliseconds)
pub const REACTION_VAR: &str = "PET_REACTION_MS";

/// Environment variable overriding [`PetConfig::wake_reaction_duration`] (milliseconds)
pub const WAKE_REACTION_VAR: &str = "PET_WAKE_REACTION_MS";

/// Environment variable overriding [`PetConfig::storage_key`]
pub const STORAGE_KEY_VAR: &str = "PET_STORAGE_KEY";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// The configuration is internally inconsistent
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Pet engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetConfig {
    /// Delay between simulation ticks.
    ///
    /// Default: 2000 ms
    pub tick_interval: Duration,

    /// How long a care reaction stays on screen.
    ///
    /// Default: 1500 ms
    pub reaction_duration: Duration,

    /// How long the waking reaction stays on screen.
    ///
    /// Default: 3000 ms
    pub wake_reaction_duration: Duration,

    /// Key the snapshot is stored under.
    ///
    /// Default: `"tamagotchi-pet"`
    pub storage_key: String,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(2000),
            reaction_duration: Duration::from_millis(1500),
            wake_reaction_duration: Duration::from_millis(3000),
            storage_key: "tamagotchi-pet".to_string(),
        }
    }
}

impl PetConfig {
    /// Default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the care reaction duration
    #[must_use]
    pub const fn with_reaction_duration(mut self, duration: Duration) -> Self {
        self.reaction_duration = duration;
        self
    }

    /// Set the waking reaction duration
    #[must_use]
    pub const fn with_wake_reaction_duration(mut self, duration: Duration) -> Self {
        self.wake_reaction_duration = duration;
        self
    }

    /// Set the storage key
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Defaults overridden by any `PET_*` variables that are set
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to something unparsable, or if
    /// the result fails [`PetConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`PetConfig::from_env`], reading variables through `lookup`
    ///
    /// # Errors
    ///
    /// See [`PetConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |var: &'static str| -> Result<Option<Duration>, ConfigError> {
            lookup(var)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .map_err(|_| ConfigError::InvalidValue { var, value })
                })
                .transpose()
        };

        let mut config = Self::default();
        if let Some(interval) = millis(TICK_INTERVAL_VAR)? {
            config.tick_interval = interval;
        }
        if let Some(duration) = millis(REACTION_VAR)? {
            config.reaction_duration = duration;
        }
        if let Some(duration) = millis(WAKE_REACTION_VAR)? {
            config.wake_reaction_duration = duration;
        }
        if let Some(key) = lookup(STORAGE_KEY_VAR) {
            config.storage_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if a duration is zero or the storage key is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Validation("tick_interval must be > 0".to_string()));
        }
        if self.reaction_duration.is_zero() {
            return Err(ConfigError::Validation(
                "reaction_duration must be > 0".to_string(),
            ));
        }
        if self.wake_reaction_duration.is_zero() {
            return Err(ConfigError::Validation(
                "wake_reaction_duration must be > 0".to_string(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation("storage_key cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_device() {
        let config = PetConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(2000));
        assert_eq!(config.reaction_duration, Duration::from_millis(1500));
        assert_eq!(config.storage_key, "tamagotchi-pet");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = PetConfig::from_lookup(lookup(&[
            (TICK_INTERVAL_VAR, "500"),
            (STORAGE_KEY_VAR, "my-pet"),
        ]));

        assert_eq!(
            config,
            Ok(PetConfig::default()
                .with_tick_interval(Duration::from_millis(500))
                .with_storage_key("my-pet"))
        );
    }

    #[test]
    fn unparsable_values_are_reported() {
        let result = PetConfig::from_lookup(lookup(&[(REACTION_VAR, "soon")]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                var: REACTION_VAR,
                value: "soon".to_string(),
            })
        );
    }

    #[test]
    fn validation_rejects_zero_durations_and_blank_keys() {
        assert!(
            PetConfig::default()
                .with_tick_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            PetConfig::default()
                .with_wake_reaction_duration(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(PetConfig::default().with_storage_key("  ").validate().is_err());
        assert!(matches!(
            PetConfig::from_lookup(lookup(&[(TICK_INTERVAL_VAR, "0")])),
            Err(ConfigError::Validation(_))
        ));
    }
}
