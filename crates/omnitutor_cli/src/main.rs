//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `omnitutor_core` linkage and the card store bootstrap.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `omnitutor_cli [LOG_DIR]`. With an absolute `LOG_DIR`, core logs
//! are written there at the build's default level.

use chrono::{TimeZone, Utc};
use omnitutor_core::db::migrations::{current_user_version, latest_version};
use omnitutor_core::db::open_db_in_memory;
use omnitutor_core::{
    default_log_level, init_logging, CardContent, Language, ReviewOutcome, Scheduler,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("omnitutor_core version={}", omnitutor_core::core_version());

    if let Some(log_dir) = std::env::args().nth(1) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging init failed: {err}");
            return ExitCode::FAILURE;
        }
        println!("logging level={} dir={log_dir}", default_log_level());
    }

    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("card store bootstrap failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    match current_user_version(&conn) {
        Ok(version) => println!("schema version={version} latest={}", latest_version()),
        Err(err) => {
            eprintln!("schema check failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    // Fixed clock so the printed schedule never changes.
    let Some(start) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() else {
        return ExitCode::FAILURE;
    };
    let scheduler = Scheduler::default();
    let mut card = scheduler.new_card(Language::German, CardContent::new("Apfel", "apple"), start);
    for outcome in [ReviewOutcome::Good, ReviewOutcome::Good, ReviewOutcome::Good] {
        card = match scheduler.schedule_review(&card, outcome, card.due_at) {
            Ok(next) => next,
            Err(err) => {
                eprintln!("schedule failed: {err}");
                return ExitCode::FAILURE;
            }
        };
        println!(
            "review={} interval_days={} due={}",
            outcome,
            card.interval_days,
            card.due_at.date_naive()
        );
    }

    ExitCode::SUCCESS
}
