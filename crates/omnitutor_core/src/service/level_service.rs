//! Learner level use-case service.

use crate::model::language::Language;
use crate::model::level::{CefrLevel, LearnerLevel};
use crate::repo::card_repo::RepoResult;
use crate::repo::level_repo::LevelRepository;
use chrono::{DateTime, Utc};
use log::info;

/// Reads and overrides the learner's CEFR level per language.
pub struct LevelService<R: LevelRepository> {
    repo: R,
}

impl<R: LevelRepository> LevelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn current_level(&self, language: Language) -> RepoResult<LearnerLevel> {
        self.repo.get_level(language)
    }

    /// Stores `level` when it differs from the current one.
    ///
    /// Returns `true` when a write happened.
    pub fn set_level(
        &self,
        language: Language,
        level: CefrLevel,
        now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let current = self.repo.get_level(language)?;
        if current.assessed_at.is_some() && current.level == level {
            return Ok(false);
        }

        self.repo.set_level(language, level, now)?;
        info!(
            "event=level_set module=service status=ok language={} from={} to={}",
            language.code(),
            current.level,
            level
        );
        Ok(true)
    }
}
