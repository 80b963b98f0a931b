//! Scheduler tuning parameters.
//!
//! # Responsibility
//! - Hold the constants of the ease-factor / interval formula.
//! - Load overrides from JSON and reject inconsistent combinations.
//!
//! # Invariants
//! - A config accepted by `validate()` can never push a card below
//!   `MIN_EASE_FACTOR` or produce a zero-day interval.

use crate::model::card::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::model::outcome::ReviewOutcome;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-outcome adjustment applied to the ease factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaseDeltas {
    pub again: f64,
    pub hard: f64,
    pub good: f64,
    pub easy: f64,
}

impl Default for EaseDeltas {
    fn default() -> Self {
        Self {
            again: -0.2,
            hard: -0.15,
            good: 0.0,
            easy: 0.15,
        }
    }
}

impl EaseDeltas {
    pub fn for_outcome(&self, outcome: ReviewOutcome) -> f64 {
        match outcome {
            ReviewOutcome::Again => self.again,
            ReviewOutcome::Hard => self.hard,
            ReviewOutcome::Good => self.good,
            ReviewOutcome::Easy => self.easy,
        }
    }
}

/// Scheduler configuration. Missing JSON fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub initial_ease: f64,
    pub min_ease: f64,
    pub ease_deltas: EaseDeltas,
    pub min_interval_days: u32,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    pub max_interval_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: DEFAULT_EASE_FACTOR,
            min_ease: MIN_EASE_FACTOR,
            ease_deltas: EaseDeltas::default(),
            min_interval_days: 1,
            first_interval_days: 1,
            second_interval_days: 6,
            max_interval_days: 36_500,
        }
    }
}

/// Rejected configuration.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse scheduler config: {err}"),
            Self::Invalid(message) => write!(f, "invalid scheduler config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl SchedulerConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("initial_ease", self.initial_ease),
            ("min_ease", self.min_ease),
            ("ease_deltas.again", self.ease_deltas.again),
            ("ease_deltas.hard", self.ease_deltas.hard),
            ("ease_deltas.good", self.ease_deltas.good),
            ("ease_deltas.easy", self.ease_deltas.easy),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
        }
        if self.min_ease < MIN_EASE_FACTOR {
            return Err(ConfigError::Invalid(format!(
                "min_ease ({}) must be >= {MIN_EASE_FACTOR}",
                self.min_ease
            )));
        }
        if self.initial_ease < self.min_ease {
            return Err(ConfigError::Invalid(format!(
                "initial_ease ({}) must be >= min_ease ({})",
                self.initial_ease, self.min_ease
            )));
        }
        if self.min_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "min_interval_days must be at least 1".to_string(),
            ));
        }
        if self.first_interval_days < self.min_interval_days
            || self.second_interval_days < self.min_interval_days
        {
            return Err(ConfigError::Invalid(format!(
                "bootstrap intervals ({}, {}) must be >= min_interval_days ({})",
                self.first_interval_days, self.second_interval_days, self.min_interval_days
            )));
        }
        if self.max_interval_days < self.second_interval_days
            || self.max_interval_days < self.first_interval_days
        {
            return Err(ConfigError::Invalid(format!(
                "max_interval_days ({}) must cover the bootstrap intervals",
                self.max_interval_days
            )));
        }
        Ok(())
    }
}
