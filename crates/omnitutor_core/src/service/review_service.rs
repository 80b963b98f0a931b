//! Review session use-case service.
//!
//! # Responsibility
//! - Turn extracted vocabulary into new cards.
//! - Build due review queues and apply review outcomes.
//!
//! # Invariants
//! - Scheduling decisions come only from `Scheduler`; this service loads and
//!   persists, it never edits scheduling fields itself.
//! - Review queues are ordered oldest-due first.
//! - A review computed from stale card state is rejected, not merged.
//! - Clock input is truncated to milliseconds before scheduling, so returned
//!   cards equal what the store holds.

use crate::model::card::{Card, CardId};
use crate::model::language::Language;
use crate::model::outcome::ReviewOutcome;
use crate::model::review::ReviewRecord;
use crate::repo::card_repo::{CardRepository, RepoError, RepoResult};
use crate::scheduler::{IntervalPreview, Scheduler, SchedulerError};
use crate::vocab::VocabItem;
use chrono::{DateTime, SubsecRound, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const QUEUE_DEFAULT_LIMIT: u32 = 10;
const QUEUE_LIMIT_MAX: u32 = 100;

/// Service error for review use-cases.
#[derive(Debug)]
pub enum ReviewServiceError {
    Scheduler(SchedulerError),
    CardNotFound(CardId),
    /// The card was reviewed elsewhere since it was loaded; reload and retry.
    Conflict(CardId),
    Repo(RepoError),
}

impl Display for ReviewServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduler(err) => write!(f, "{err}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::Conflict(id) => write!(f, "card {id} changed during review"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReviewServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Scheduler(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchedulerError> for ReviewServiceError {
    fn from(value: SchedulerError) -> Self {
        Self::Scheduler(value)
    }
}

impl From<RepoError> for ReviewServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::CardNotFound(id),
            RepoError::Conflict(id) => Self::Conflict(id),
            other => Self::Repo(other),
        }
    }
}

pub type ReviewServiceResult<T> = Result<T, ReviewServiceError>;

/// Outcome of adding a batch of vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabIntake {
    /// Cards created by this call, in input order.
    pub created: Vec<CardId>,
    /// Words skipped because they were blank or already stored.
    pub skipped: Vec<String>,
}

/// Use-case service for vocabulary intake and reviews.
pub struct ReviewService<R: CardRepository> {
    repo: R,
    scheduler: Scheduler,
}

impl<R: CardRepository> ReviewService<R> {
    /// Creates a service with the default scheduler configuration.
    pub fn new(repo: R) -> Self {
        Self::with_scheduler(repo, Scheduler::default())
    }

    pub fn with_scheduler(repo: R, scheduler: Scheduler) -> Self {
        Self { repo, scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Stores new vocabulary as cards due immediately.
    ///
    /// Known terms keep their existing progress and are reported as skipped.
    /// The batch is written in one transaction; on error nothing is stored.
    pub fn add_vocabulary(
        &mut self,
        language: Language,
        items: &[VocabItem],
        now: DateTime<Utc>,
    ) -> RepoResult<VocabIntake> {
        let now = storage_instant(now);
        let batch: Vec<Card> = items
            .iter()
            .filter(|item| !item.word.trim().is_empty())
            .map(|item| {
                self.scheduler
                    .new_card(language, item.clone().into_content(), now)
            })
            .collect();
        let inserted = self.repo.insert_cards_if_absent(&batch)?;
        let mut results = batch.iter().zip(inserted);

        let mut intake = VocabIntake::default();
        for item in items {
            if item.word.trim().is_empty() {
                intake.skipped.push(item.word.clone());
                continue;
            }
            match results.next() {
                Some((card, true)) => intake.created.push(card.id),
                _ => intake.skipped.push(item.word.clone()),
            }
        }

        info!(
            "event=vocab_add module=service status=ok language={} created={} skipped={}",
            language.code(),
            intake.created.len(),
            intake.skipped.len()
        );
        Ok(intake)
    }

    /// Returns due cards for `language`, oldest-due first.
    ///
    /// `limit` defaults to 10 and is clamped to 100.
    pub fn review_queue(
        &self,
        language: Language,
        now: DateTime<Utc>,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Card>> {
        self.repo
            .list_due_cards(language, now, normalize_queue_limit(limit))
    }

    pub fn due_count(&self, language: Language, now: DateTime<Utc>) -> RepoResult<u64> {
        self.repo.count_due(language, now)
    }

    /// Applies one review outcome to a stored card and persists the result.
    ///
    /// # Errors
    /// - `CardNotFound` when `card_id` is unknown.
    /// - `Scheduler(TemporalInconsistency)` when `now` precedes the last review.
    /// - `Conflict` when another review for the same card landed first.
    pub fn submit_review(
        &mut self,
        card_id: CardId,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> ReviewServiceResult<Card> {
        let now = storage_instant(now);
        let card = self
            .repo
            .get_card(card_id)?
            .ok_or(ReviewServiceError::CardNotFound(card_id))?;

        let updated = self.scheduler.schedule_review(&card, outcome, now)?;
        let record = ReviewRecord::from_reviewed(&updated, outcome);

        if let Err(err) = self.repo.save_review(&card, &updated, &record) {
            warn!(
                "event=review_submit module=service status=error card_id={} outcome={} error={}",
                card_id, outcome, err
            );
            return Err(err.into());
        }

        info!(
            "event=review_submit module=service status=ok card_id={} outcome={} interval_days={} repetitions={}",
            card_id, outcome, updated.interval_days, updated.repetitions
        );
        Ok(updated)
    }

    /// Same as `submit_review`, parsing the outcome from free-form input.
    pub fn submit_review_label(
        &mut self,
        card_id: CardId,
        outcome: &str,
        now: DateTime<Utc>,
    ) -> ReviewServiceResult<Card> {
        let outcome = outcome
            .parse::<ReviewOutcome>()
            .map_err(SchedulerError::from)?;
        self.submit_review(card_id, outcome, now)
    }

    /// Intervals each outcome would give the stored card.
    pub fn preview(
        &self,
        card_id: CardId,
        now: DateTime<Utc>,
    ) -> ReviewServiceResult<[IntervalPreview; 4]> {
        let now = storage_instant(now);
        let card = self
            .repo
            .get_card(card_id)?
            .ok_or(ReviewServiceError::CardNotFound(card_id))?;
        Ok(self.scheduler.preview(&card, now)?)
    }

    pub fn history(&self, card_id: CardId) -> RepoResult<Vec<ReviewRecord>> {
        self.repo.list_reviews(card_id)
    }

    /// Removes a card at the learner's request.
    pub fn remove_card(&self, card_id: CardId) -> ReviewServiceResult<()> {
        self.repo.delete_card(card_id)?;
        info!("event=card_remove module=service status=ok card_id={card_id}");
        Ok(())
    }
}

/// The store keeps millisecond timestamps.
fn storage_instant(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(3)
}

fn normalize_queue_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => QUEUE_DEFAULT_LIMIT,
        Some(value) => value.min(QUEUE_LIMIT_MAX),
    }
}
