//! Learner level persistence.
//!
//! # Invariants
//! - At most one level row exists per language.
//! - Languages without a row report `CefrLevel::A1` and no assessment time.

use crate::db::{from_epoch_ms, to_epoch_ms};
use crate::model::language::Language;
use crate::model::level::{CefrLevel, LearnerLevel};
use crate::repo::card_repo::{RepoError, RepoResult};
use crate::repo::ensure_tables_ready;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for per-language learner levels.
pub trait LevelRepository {
    fn get_level(&self, language: Language) -> RepoResult<LearnerLevel>;
    /// Creates or replaces the stored level for `language`.
    fn set_level(
        &self,
        language: Language,
        level: CefrLevel,
        assessed_at: DateTime<Utc>,
    ) -> RepoResult<()>;
}

/// SQLite-backed level repository.
pub struct SqliteLevelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLevelRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_ready(conn, &["learner_levels"])?;
        Ok(Self { conn })
    }
}

impl LevelRepository for SqliteLevelRepository<'_> {
    fn get_level(&self, language: Language) -> RepoResult<LearnerLevel> {
        let stored = self
            .conn
            .query_row(
                "SELECT level, assessed_at FROM learner_levels WHERE language = ?1;",
                [language.code()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((level_text, assessed_ms)) = stored else {
            return Ok(LearnerLevel::unassessed(language));
        };

        let level = CefrLevel::parse(&level_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid level `{level_text}` in learner_levels.level"
            ))
        })?;
        let assessed_at = from_epoch_ms(assessed_ms).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "timestamp `{assessed_ms}` out of range in learner_levels.assessed_at"
            ))
        })?;

        Ok(LearnerLevel {
            language,
            level,
            assessed_at: Some(assessed_at),
        })
    }

    fn set_level(
        &self,
        language: Language,
        level: CefrLevel,
        assessed_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO learner_levels (language, level, assessed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (language) DO UPDATE SET
                level = excluded.level,
                assessed_at = excluded.assessed_at;",
            params![language.code(), level.as_str(), to_epoch_ms(assessed_at)],
        )?;
        Ok(())
    }
}
