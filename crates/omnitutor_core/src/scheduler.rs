//! Spaced-repetition scheduler.
//!
//! # Responsibility
//! - Compute a card's next scheduling state from one review outcome.
//! - Select and order the cards that are due for review.
//!
//! # Invariants
//! - Scheduling is pure: input cards are never mutated and nothing is
//!   persisted here.
//! - Ease factor never drops below `SchedulerConfig::min_ease`.
//! - A failed review resets repetitions to 0 and the interval to
//!   `min_interval_days`.
//! - `due_at = now + interval_days` and `last_reviewed_at = now` after every
//!   review.

use crate::config::{ConfigError, SchedulerConfig};
use crate::model::card::{Card, CardContent};
use crate::model::language::Language;
use crate::model::outcome::{OutcomeParseError, ReviewOutcome};
use chrono::{DateTime, Duration, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Rejected review input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Outcome input is not one of again|hard|good|easy.
    InvalidOutcome { value: String },
    /// `now` precedes the card's last review.
    TemporalInconsistency {
        now: DateTime<Utc>,
        last_reviewed_at: DateTime<Utc>,
    },
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOutcome { value } => write!(f, "invalid review outcome `{value}`"),
            Self::TemporalInconsistency {
                now,
                last_reviewed_at,
            } => write!(
                f,
                "review time {now} precedes last review at {last_reviewed_at}"
            ),
        }
    }
}

impl Error for SchedulerError {}

impl From<OutcomeParseError> for SchedulerError {
    fn from(value: OutcomeParseError) -> Self {
        Self::InvalidOutcome { value: value.value }
    }
}

/// Interval a card would get for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPreview {
    pub outcome: ReviewOutcome,
    pub interval_days: u32,
    pub due_at: DateTime<Utc>,
}

impl IntervalPreview {
    /// Compact label for review buttons, e.g. `6d`, `2w`, `3mo`.
    pub fn label(&self) -> String {
        format_interval(self.interval_days)
    }
}

/// Ease-factor / multiplicative-interval scheduler.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler after validating `config`.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Creates a card that is due immediately, using the configured initial ease.
    pub fn new_card(&self, language: Language, content: CardContent, now: DateTime<Utc>) -> Card {
        let mut card = Card::new(language, content, now);
        card.ease_factor = self.config.initial_ease;
        card
    }

    /// Applies one review outcome and returns the updated card.
    ///
    /// # Errors
    /// - `TemporalInconsistency` when `now < card.last_reviewed_at`.
    pub fn schedule_review(
        &self,
        card: &Card,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Card> {
        ensure_monotonic(card, now)?;
        Ok(self.apply(card, outcome, now))
    }

    /// Same as `schedule_review`, parsing the outcome from free-form input.
    ///
    /// # Errors
    /// - `InvalidOutcome` for unrecognized labels.
    /// - `TemporalInconsistency` when `now < card.last_reviewed_at`.
    pub fn schedule_review_label(
        &self,
        card: &Card,
        outcome: &str,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Card> {
        let outcome = outcome.parse::<ReviewOutcome>()?;
        self.schedule_review(card, outcome, now)
    }

    /// Returns the interval each outcome would produce, in button order.
    pub fn preview(&self, card: &Card, now: DateTime<Utc>) -> SchedulerResult<[IntervalPreview; 4]> {
        ensure_monotonic(card, now)?;
        Ok(ReviewOutcome::ALL.map(|outcome| {
            let next = self.apply(card, outcome, now);
            IntervalPreview {
                outcome,
                interval_days: next.interval_days,
                due_at: next.due_at,
            }
        }))
    }

    fn apply(&self, card: &Card, outcome: ReviewOutcome, now: DateTime<Utc>) -> Card {
        let config = &self.config;
        let ease_factor =
            (card.ease_factor + config.ease_deltas.for_outcome(outcome)).max(config.min_ease);

        let mut next = card.clone();
        next.ease_factor = ease_factor;

        if outcome.is_failure() {
            next.repetitions = 0;
            next.interval_days = config.min_interval_days;
            next.lapses = card.lapses.saturating_add(1);
        } else {
            let interval = match card.repetitions {
                0 => config.first_interval_days,
                1 => config.second_interval_days,
                _ => scale_interval(card.interval_days, ease_factor, config.max_interval_days),
            };
            next.repetitions = card.repetitions.saturating_add(1);
            next.interval_days = interval.clamp(config.min_interval_days, config.max_interval_days);
        }

        next.last_reviewed_at = now;
        next.due_at = now
            .checked_add_signed(Duration::days(i64::from(next.interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        next
    }
}

/// Lazy, restartable view over the due subset of a card collection.
///
/// Iteration yields cards with `due_at <= now`, oldest-due first, ties broken
/// by card id. Filtering and ordering run on each iteration, so the same
/// inputs always produce the same sequence.
#[derive(Debug, Clone, Copy)]
pub struct DueCards<'a> {
    cards: &'a [Card],
    now: DateTime<Utc>,
}

impl<'a> DueCards<'a> {
    pub fn iter(&self) -> std::vec::IntoIter<&'a Card> {
        let now = self.now;
        let mut due = self
            .cards
            .iter()
            .filter(|card| card.is_due(now))
            .collect::<Vec<_>>();
        due.sort_by(|left, right| {
            left.due_at
                .cmp(&right.due_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        due.into_iter()
    }

    /// Number of due cards, without ordering them.
    pub fn count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_due(self.now)).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cards.iter().any(|card| card.is_due(self.now))
    }
}

impl<'a> IntoIterator for DueCards<'a> {
    type Item = &'a Card;
    type IntoIter = std::vec::IntoIter<&'a Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &DueCards<'a> {
    type Item = &'a Card;
    type IntoIter = std::vec::IntoIter<&'a Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Selects cards due at `now`, oldest-due first.
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> DueCards<'_> {
    DueCards { cards, now }
}

fn ensure_monotonic(card: &Card, now: DateTime<Utc>) -> SchedulerResult<()> {
    if now < card.last_reviewed_at {
        return Err(SchedulerError::TemporalInconsistency {
            now,
            last_reviewed_at: card.last_reviewed_at,
        });
    }
    Ok(())
}

fn scale_interval(previous_days: u32, ease_factor: f64, max_days: u32) -> u32 {
    let scaled = (f64::from(previous_days) * ease_factor).round();
    if scaled >= f64::from(max_days) {
        max_days
    } else {
        scaled as u32
    }
}

fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{days}d"),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
