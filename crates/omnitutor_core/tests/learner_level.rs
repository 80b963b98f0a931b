use chrono::{Duration, TimeZone, Utc};
use omnitutor_core::db::open_db_in_memory;
use omnitutor_core::{CefrLevel, Language, LevelRepository, LevelService, SqliteLevelRepository};

#[test]
fn unset_language_defaults_to_a1() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLevelRepository::try_new(&conn).unwrap();

    let level = repo.get_level(Language::French).unwrap();
    assert_eq!(level.level, CefrLevel::A1);
    assert_eq!(level.language, Language::French);
    assert!(level.assessed_at.is_none());
}

#[test]
fn set_level_upserts_per_language() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLevelRepository::try_new(&conn).unwrap();
    let assessed = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    repo.set_level(Language::German, CefrLevel::B1, assessed)
        .unwrap();
    repo.set_level(
        Language::German,
        CefrLevel::B2,
        assessed + Duration::days(7),
    )
    .unwrap();

    let german = repo.get_level(Language::German).unwrap();
    assert_eq!(german.level, CefrLevel::B2);
    assert_eq!(german.assessed_at, Some(assessed + Duration::days(7)));
    assert_eq!(repo.get_level(Language::Spanish).unwrap().level, CefrLevel::A1);
}

#[test]
fn service_skips_write_when_level_is_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let service = LevelService::new(SqliteLevelRepository::try_new(&conn).unwrap());
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    assert!(service.set_level(Language::English, CefrLevel::A1, now).unwrap());
    assert!(!service
        .set_level(Language::English, CefrLevel::A1, now + Duration::days(1))
        .unwrap());
    assert!(service
        .set_level(Language::English, CefrLevel::C1, now + Duration::days(2))
        .unwrap());

    let current = service.current_level(Language::English).unwrap();
    assert_eq!(current.level, CefrLevel::C1);
    assert_eq!(current.assessed_at, Some(now + Duration::days(2)));
}
