//! Card repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and due-queue queries over the `cards` table.
//! - Persist review results together with their history row.
//!
//! # Invariants
//! - Write paths call `Card::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `(language, term)` is unique, compared case-insensitively; inserting a
//!   known term never overwrites its review progress.
//! - `save_review` only applies when the stored card still matches the state
//!   the review was computed from.

use crate::db::{from_epoch_ms, to_epoch_ms, DbError};
use crate::model::card::{Card, CardContent, CardId, CardValidationError};
use crate::model::language::Language;
use crate::model::outcome::ReviewOutcome;
use crate::model::review::ReviewRecord;
use crate::repo::ensure_tables_ready;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CARD_SELECT_SQL: &str = "SELECT
    id,
    language,
    term,
    meaning,
    ease_factor,
    interval_days,
    repetitions,
    lapses,
    due_at,
    last_reviewed_at,
    created_at
FROM cards";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for card persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CardValidationError),
    Db(DbError),
    NotFound(CardId),
    /// The stored card changed since the caller loaded it.
    Conflict(CardId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "card not found: {id}"),
            Self::Conflict(id) => write!(f, "card {id} was modified concurrently"),
            Self::InvalidData(message) => write!(f, "invalid persisted card data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CardValidationError> for RepoError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardListQuery {
    pub language: Option<Language>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for the card store.
pub trait CardRepository {
    /// Inserts `card` unless its `(language, term)` is already stored.
    /// Returns `true` when a row was created.
    fn insert_card_if_absent(&self, card: &Card) -> RepoResult<bool>;
    /// Batch form of `insert_card_if_absent` in a single transaction: either
    /// every new card is stored or none is. One flag per input card.
    fn insert_cards_if_absent(&mut self, cards: &[Card]) -> RepoResult<Vec<bool>>;
    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>>;
    /// Looks up a card by term, case-insensitively.
    fn find_by_term(&self, language: Language, term: &str) -> RepoResult<Option<Card>>;
    /// Lists cards ordered by `created_at ASC, id ASC`.
    fn list_cards(&self, query: &CardListQuery) -> RepoResult<Vec<Card>>;
    /// Lists cards due at `now`, ordered by `due_at ASC, id ASC`.
    fn list_due_cards(
        &self,
        language: Language,
        now: DateTime<Utc>,
        limit: u32,
    ) -> RepoResult<Vec<Card>>;
    fn count_due(&self, language: Language, now: DateTime<Utc>) -> RepoResult<u64>;
    /// Replaces `previous` with `updated` and appends `record`, atomically.
    fn save_review(
        &mut self,
        previous: &Card,
        updated: &Card,
        record: &ReviewRecord,
    ) -> RepoResult<()>;
    /// Review history for one card, oldest first.
    fn list_reviews(&self, card_id: CardId) -> RepoResult<Vec<ReviewRecord>>;
    /// Hard-deletes a card and its history.
    fn delete_card(&self, id: CardId) -> RepoResult<()>;
}

/// SQLite-backed card repository.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_tables_ready(conn, &["cards", "review_log"])?;
        Ok(Self { conn })
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn insert_card_if_absent(&self, card: &Card) -> RepoResult<bool> {
        insert_card_row(self.conn, card)
    }

    fn insert_cards_if_absent(&mut self, cards: &[Card]) -> RepoResult<Vec<bool>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = Vec::with_capacity(cards.len());
        for card in cards {
            inserted.push(insert_card_row(&tx, card)?);
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CARD_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    fn find_by_term(&self, language: Language, term: &str) -> RepoResult<Option<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL} WHERE language = ?1 AND term_key = ?2;"
        ))?;
        let mut rows = stmt.query(params![language.code(), term_key(term)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    fn list_cards(&self, query: &CardListQuery) -> RepoResult<Vec<Card>> {
        let mut sql = format!("{CARD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(language) = query.language {
            sql.push_str(" AND language = ?");
            bind_values.push(Value::Text(language.code().to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            None if query.offset > 0 => sql.push_str(" LIMIT -1"),
            None => {}
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_cards(rows)
    }

    fn list_due_cards(
        &self,
        language: Language,
        now: DateTime<Utc>,
        limit: u32,
    ) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE language = ?1 AND due_at <= ?2
             ORDER BY due_at ASC, id ASC
             LIMIT ?3;"
        ))?;
        let rows = stmt.query(params![language.code(), to_epoch_ms(now), limit])?;
        collect_cards(rows)
    }

    fn count_due(&self, language: Language, now: DateTime<Utc>) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE language = ?1 AND due_at <= ?2;",
            params![language.code(), to_epoch_ms(now)],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative due count `{count}`")))
    }

    fn save_review(
        &mut self,
        previous: &Card,
        updated: &Card,
        record: &ReviewRecord,
    ) -> RepoResult<()> {
        if previous.id != updated.id || record.card_id != updated.id {
            return Err(RepoError::InvalidData(format!(
                "review for card {} does not match card {}",
                record.card_id, previous.id
            )));
        }
        updated.validate()?;

        let id_text = updated.id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE cards
             SET
                ease_factor = ?2,
                interval_days = ?3,
                repetitions = ?4,
                lapses = ?5,
                due_at = ?6,
                last_reviewed_at = ?7
             WHERE id = ?1
               AND last_reviewed_at = ?8
               AND repetitions = ?9
               AND lapses = ?10;",
            params![
                id_text.as_str(),
                updated.ease_factor,
                updated.interval_days,
                updated.repetitions,
                updated.lapses,
                to_epoch_ms(updated.due_at),
                to_epoch_ms(updated.last_reviewed_at),
                to_epoch_ms(previous.last_reviewed_at),
                previous.repetitions,
                previous.lapses,
            ],
        )?;

        if changed == 0 {
            let exists = tx
                .query_row("SELECT 1 FROM cards WHERE id = ?1;", [id_text.as_str()], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()?
                .is_some();
            return Err(if exists {
                RepoError::Conflict(updated.id)
            } else {
                RepoError::NotFound(updated.id)
            });
        }

        tx.execute(
            "INSERT INTO review_log (
                id,
                card_id,
                outcome,
                ease_factor,
                interval_days,
                repetitions,
                reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.to_string(),
                id_text.as_str(),
                record.outcome.as_str(),
                record.ease_factor,
                record.interval_days,
                record.repetitions,
                to_epoch_ms(record.reviewed_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_reviews(&self, card_id: CardId) -> RepoResult<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, card_id, outcome, ease_factor, interval_days, repetitions, reviewed_at
             FROM review_log
             WHERE card_id = ?1
             ORDER BY reviewed_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([card_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_review_row(row)?);
        }
        Ok(records)
    }

    fn delete_card(&self, id: CardId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}



fn insert_card_row(conn: &Connection, card: &Card) -> RepoResult<bool> {
    card.validate()?;

    let changed = conn.execute(
        "INSERT INTO cards (
            id,
            language,
            term,
            term_key,
            meaning,
            ease_factor,
            interval_days,
            repetitions,
            lapses,
            due_at,
            last_reviewed_at,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT (language, term_key) DO NOTHING;",
        params![
            card.id.to_string(),
            card.language.code(),
            card.content.term.trim(),
            term_key(&card.content.term),
            card.content.meaning.trim(),
            card.ease_factor,
            card.interval_days,
            card.repetitions,
            card.lapses,
            to_epoch_ms(card.due_at),
            to_epoch_ms(card.last_reviewed_at),
            to_epoch_ms(card.created_at),
        ],
    )?;

    Ok(changed == 1)
}

/// Uniqueness key for a term: trimmed and lowercased.
fn term_key(term: &str) -> String {
    term.trim().to_lowercase()
}

fn collect_cards(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Card>> {
    let mut cards = Vec::new();
    while let Some(row) = rows.next()? {
        cards.push(parse_card_row(row)?);
    }
    Ok(cards)
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "cards.id")?;

    let language_text: String = row.get("language")?;
    let language = Language::parse(&language_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid language `{language_text}` in cards.language"
        ))
    })?;

    let card = Card {
        id,
        language,
        content: CardContent {
            term: row.get("term")?,
            meaning: row.get("meaning")?,
        },
        ease_factor: row.get("ease_factor")?,
        interval_days: row.get("interval_days")?,
        repetitions: row.get("repetitions")?,
        lapses: row.get("lapses")?,
        due_at: parse_timestamp(row, "due_at")?,
        last_reviewed_at: parse_timestamp(row, "last_reviewed_at")?,
        created_at: parse_timestamp(row, "created_at")?,
    };
    card.validate()?;
    Ok(card)
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<ReviewRecord> {
    let id_text: String = row.get("id")?;
    let card_id_text: String = row.get("card_id")?;
    let outcome_text: String = row.get("outcome")?;
    let outcome = outcome_text.parse::<ReviewOutcome>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid outcome `{outcome_text}` in review_log.outcome"
        ))
    })?;

    Ok(ReviewRecord {
        id: parse_uuid(&id_text, "review_log.id")?,
        card_id: parse_uuid(&card_id_text, "review_log.card_id")?,
        outcome,
        ease_factor: row.get("ease_factor")?,
        interval_days: row.get("interval_days")?,
        repetitions: row.get("repetitions")?,
        reviewed_at: parse_timestamp(row, "reviewed_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_timestamp(row: &Row<'_>, column: &str) -> RepoResult<DateTime<Utc>> {
    let value: i64 = row.get(column)?;
    from_epoch_ms(value).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{value}` out of range in {column}"))
    })
}
