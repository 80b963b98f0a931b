//! Card domain model.
//!
//! # Responsibility
//! - Define the vocabulary card tracked by the review scheduler.
//! - Provide validation for scheduling invariants shared by all layers.
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - `due_at` is never earlier than `last_reviewed_at`.
//! - `ease_factor` is finite and never below `MIN_EASE_FACTOR`.
//! - A freshly created card is due immediately.

use crate::model::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every card.
pub type CardId = Uuid;

/// Ease factor assigned to new cards.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
/// Lowest ease factor any card may carry.
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Upper bound of the star rating shown for a card.
pub const MAX_PROFICIENCY: u8 = 5;

/// The learned text/meaning pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardContent {
    /// Foreign-language term as introduced by a lesson.
    pub term: String,
    /// Meaning in the learner's base language.
    pub meaning: String,
}

impl CardContent {
    pub fn new(term: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            meaning: meaning.into(),
        }
    }
}

/// Validation errors for card scheduling invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValidationError {
    NilId,
    EmptyTerm,
    InvalidEaseFactor(f64),
    DueBeforeLastReviewed {
        due_at: DateTime<Utc>,
        last_reviewed_at: DateTime<Utc>,
    },
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "card id must not be nil"),
            Self::EmptyTerm => write!(f, "card term must not be empty"),
            Self::InvalidEaseFactor(value) => write!(
                f,
                "ease factor ({value}) must be finite and >= {MIN_EASE_FACTOR}"
            ),
            Self::DueBeforeLastReviewed {
                due_at,
                last_reviewed_at,
            } => write!(
                f,
                "due_at ({due_at}) must be >= last_reviewed_at ({last_reviewed_at})"
            ),
        }
    }
}

impl Error for CardValidationError {}

/// A vocabulary item with its spaced-repetition state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardWire")]
pub struct Card {
    pub id: CardId,
    pub language: Language,
    pub content: CardContent,
    pub ease_factor: f64,
    /// Days between the last review and `due_at`.
    pub interval_days: u32,
    /// Consecutive successful reviews. Reset to 0 on failure.
    pub repetitions: u32,
    /// Failed reviews over the card lifetime.
    pub lapses: u32,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Creates a new card that is reviewable at `created_at`.
    pub fn new(language: Language, content: CardContent, created_at: DateTime<Utc>) -> Self {
        Self::new_unchecked(Uuid::new_v4(), language, content, created_at)
    }

    /// Creates a new card with a caller-provided stable ID.
    ///
    /// # Errors
    /// - Returns `CardValidationError::NilId` for `Uuid::nil()`.
    pub fn with_id(
        id: CardId,
        language: Language,
        content: CardContent,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CardValidationError> {
        if id.is_nil() {
            return Err(CardValidationError::NilId);
        }
        Ok(Self::new_unchecked(id, language, content, created_at))
    }

    fn new_unchecked(
        id: CardId,
        language: Language,
        content: CardContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            language,
            content,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            lapses: 0,
            due_at: created_at,
            last_reviewed_at: created_at,
            created_at,
        }
    }

    /// Validates scheduling invariants.
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.id.is_nil() {
            return Err(CardValidationError::NilId);
        }
        if self.content.term.trim().is_empty() {
            return Err(CardValidationError::EmptyTerm);
        }
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(CardValidationError::InvalidEaseFactor(self.ease_factor));
        }
        if self.due_at < self.last_reviewed_at {
            return Err(CardValidationError::DueBeforeLastReviewed {
                due_at: self.due_at,
                last_reviewed_at: self.last_reviewed_at,
            });
        }
        Ok(())
    }

    /// Returns whether the card should be presented at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    /// Star rating from 0 to `MAX_PROFICIENCY`, driven by the success streak.
    pub fn proficiency(&self) -> u8 {
        self.repetitions.min(u32::from(MAX_PROFICIENCY)) as u8
    }
}

#[derive(Deserialize)]
struct CardWire {
    id: CardId,
    language: Language,
    content: CardContent,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    #[serde(default)]
    lapses: u32,
    due_at: DateTime<Utc>,
    last_reviewed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CardWire> for Card {
    type Error = CardValidationError;

    fn try_from(wire: CardWire) -> Result<Self, Self::Error> {
        let card = Self {
            id: wire.id,
            language: wire.language,
            content: wire.content,
            ease_factor: wire.ease_factor,
            interval_days: wire.interval_days,
            repetitions: wire.repetitions,
            lapses: wire.lapses,
            due_at: wire.due_at,
            last_reviewed_at: wire.last_reviewed_at,
            created_at: wire.created_at,
        };
        card.validate()?;
        Ok(card)
    }
}
