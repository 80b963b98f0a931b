//! Review outcome reported by the learner.
//!
//! # Invariants
//! - The outcome set is closed; free-form input is validated at the boundary.
//! - Only `Again` counts as a failed recall.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Self-reported recall quality for one review event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Again,
    Hard,
    Good,
    Easy,
}

/// Raised when outcome input is outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeParseError {
    pub value: String,
}

impl Display for OutcomeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unrecognized review outcome `{}`; expected again|hard|good|easy",
            self.value
        )
    }
}

impl Error for OutcomeParseError {}

impl ReviewOutcome {
    /// Button order used by review screens.
    pub const ALL: [ReviewOutcome; 4] = [
        ReviewOutcome::Again,
        ReviewOutcome::Hard,
        ReviewOutcome::Good,
        ReviewOutcome::Easy,
    ];

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Again)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl Display for ReviewOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewOutcome {
    type Err = OutcomeParseError;

    /// Accepts the four outcome names plus pass/fail style aliases.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "again" | "fail" | "forgot" => Ok(Self::Again),
            "hard" => Ok(Self::Hard),
            "good" | "pass" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(OutcomeParseError {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for ReviewOutcome {
    type Error = OutcomeParseError;

    /// Maps a zero-based button index (`0..=3`) to an outcome.
    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| OutcomeParseError {
                value: index.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewOutcome;

    #[test]
    fn aliases_map_to_canonical_outcomes() {
        assert_eq!("FORGOT".parse::<ReviewOutcome>().unwrap(), ReviewOutcome::Again);
        assert_eq!(" pass ".parse::<ReviewOutcome>().unwrap(), ReviewOutcome::Good);
        assert_eq!("easy".parse::<ReviewOutcome>().unwrap(), ReviewOutcome::Easy);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "meh".parse::<ReviewOutcome>().unwrap_err();
        assert_eq!(err.value, "meh");
    }

    #[test]
    fn button_index_maps_in_order() {
        assert_eq!(ReviewOutcome::try_from(0).unwrap(), ReviewOutcome::Again);
        assert_eq!(ReviewOutcome::try_from(3).unwrap(), ReviewOutcome::Easy);
        assert!(ReviewOutcome::try_from(4).is_err());
    }

    #[test]
    fn only_again_is_failure() {
        let failures: Vec<_> = ReviewOutcome::ALL
            .into_iter()
            .filter(|outcome| outcome.is_failure())
            .collect();
        assert_eq!(failures, vec![ReviewOutcome::Again]);
    }
}
