//! Review history record.

use crate::model::card::{Card, CardId};
use crate::model::outcome::ReviewOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One applied review event, capturing the card state it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub card_id: CardId,
    pub outcome: ReviewOutcome,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Builds a record from a card already updated by the scheduler.
    pub fn from_reviewed(card: &Card, outcome: ReviewOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id: card.id,
            outcome,
            ease_factor: card.ease_factor,
            interval_days: card.interval_days,
            repetitions: card.repetitions,
            reviewed_at: card.last_reviewed_at,
        }
    }
}
