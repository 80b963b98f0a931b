//! Domain model for vocabulary cards and their review state.
//!
//! # Responsibility
//! - Define canonical data structures used by the scheduler and storage.
//! - Keep free-form input (outcomes, languages, levels) behind closed enums.
//!
//! # Invariants
//! - Every card is identified by a stable `CardId`.
//! - Card scheduling fields only change through the scheduler.

pub mod card;
pub mod language;
pub mod level;
pub mod outcome;
pub mod review;
