//! Core domain logic for the Omni-Tutor vocabulary trainer.
//! This crate owns card scheduling and the local card store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;
pub mod vocab;

pub use config::{ConfigError, EaseDeltas, SchedulerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::card::{
    Card, CardContent, CardId, CardValidationError, DEFAULT_EASE_FACTOR, MAX_PROFICIENCY,
    MIN_EASE_FACTOR,
};
pub use model::language::Language;
pub use model::level::{CefrLevel, LearnerLevel};
pub use model::outcome::{OutcomeParseError, ReviewOutcome};
pub use model::review::ReviewRecord;
pub use repo::card_repo::{
    CardListQuery, CardRepository, RepoError, RepoResult, SqliteCardRepository,
};
pub use repo::level_repo::{LevelRepository, SqliteLevelRepository};
pub use scheduler::{
    due_cards, DueCards, IntervalPreview, Scheduler, SchedulerError, SchedulerResult,
};
pub use service::level_service::LevelService;
pub use service::review_service::{
    ReviewService, ReviewServiceError, ReviewServiceResult, VocabIntake,
};
pub use vocab::{parse_vocab_payload, VocabItem, VocabParseError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
