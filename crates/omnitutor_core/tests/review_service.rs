use chrono::{DateTime, Duration, TimeZone, Utc};
use omnitutor_core::db::open_db_in_memory;
use omnitutor_core::{
    due_cards, parse_vocab_payload, CardRepository, Language, ReviewOutcome, ReviewService,
    ReviewServiceError, Scheduler, SchedulerConfig, SchedulerError, SqliteCardRepository,
    VocabItem,
};
use uuid::Uuid;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

#[test]
fn add_vocabulary_creates_due_cards_and_skips_known_terms() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let items = vec![
        VocabItem::new("Hund", "dog"),
        VocabItem::new("Katze", "cat"),
        VocabItem::new("  ", "blank"),
    ];
    let intake = service
        .add_vocabulary(Language::German, &items, t0())
        .unwrap();
    assert_eq!(intake.created.len(), 2);
    assert_eq!(intake.skipped, vec!["  ".to_string()]);

    let again = service
        .add_vocabulary(Language::German, &[VocabItem::new("hund", "hound")], t0())
        .unwrap();
    assert!(again.created.is_empty());
    assert_eq!(again.skipped, vec!["hund".to_string()]);

    assert_eq!(service.due_count(Language::German, t0()).unwrap(), 2);
    assert_eq!(service.due_count(Language::Spanish, t0()).unwrap(), 0);
}

#[test]
fn submit_review_schedules_and_persists() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let intake = service
        .add_vocabulary(Language::Spanish, &[VocabItem::new("casa", "house")], t0())
        .unwrap();
    let card_id = intake.created[0];

    let first = service
        .submit_review(card_id, ReviewOutcome::Good, t0())
        .unwrap();
    assert_eq!(first.interval_days, 1);
    assert_eq!(first.repetitions, 1);
    assert_eq!(service.due_count(Language::Spanish, t0()).unwrap(), 0);

    let second = service
        .submit_review_label(card_id, "pass", first.due_at)
        .unwrap();
    assert_eq!(second.interval_days, 6);
    assert_eq!(second.proficiency(), 2);

    let failed = service
        .submit_review(card_id, ReviewOutcome::Again, second.due_at)
        .unwrap();
    assert_eq!(failed.repetitions, 0);
    assert_eq!(failed.interval_days, 1);
    assert_eq!(failed.lapses, 1);

    let history = service.history(card_id).unwrap();
    let outcomes: Vec<_> = history.iter().map(|record| record.outcome).collect();
    assert_eq!(
        outcomes,
        vec![ReviewOutcome::Good, ReviewOutcome::Good, ReviewOutcome::Again]
    );
}

#[test]
fn review_queue_returns_oldest_due_first_with_limit() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let words = ["un", "deux", "trois"];
    let mut ids = Vec::new();
    for (offset, word) in words.into_iter().enumerate() {
        let created = t0() + Duration::minutes(offset as i64);
        let intake = service
            .add_vocabulary(Language::French, &[VocabItem::new(word, "n")], created)
            .unwrap();
        ids.push(intake.created[0]);
    }

    // Reviewing "un" pushes it a day out.
    service
        .submit_review(ids[0], ReviewOutcome::Easy, t0() + Duration::minutes(5))
        .unwrap();

    let now = t0() + Duration::minutes(10);
    let queue = service.review_queue(Language::French, now, None).unwrap();
    let queued: Vec<_> = queue.iter().map(|card| card.id).collect();
    assert_eq!(queued, vec![ids[1], ids[2]]);

    let limited = service
        .review_queue(Language::French, now, Some(1))
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, ids[1]);

    let tomorrow = t0() + Duration::days(2);
    assert_eq!(
        service
            .review_queue(Language::French, tomorrow, None)
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn submit_review_rejects_unknown_card_and_bad_input() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let missing = Uuid::new_v4();
    let err = service
        .submit_review(missing, ReviewOutcome::Good, t0())
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::CardNotFound(id) if id == missing));

    let intake = service
        .add_vocabulary(Language::English, &[VocabItem::new("tide", "Gezeiten")], t0())
        .unwrap();
    let card_id = intake.created[0];

    let err = service
        .submit_review_label(card_id, "so-so", t0())
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewServiceError::Scheduler(SchedulerError::InvalidOutcome { .. })
    ));

    let err = service
        .submit_review(card_id, ReviewOutcome::Good, t0() - Duration::days(1))
        .unwrap_err();
    assert!(matches!(
        err,
        ReviewServiceError::Scheduler(SchedulerError::TemporalInconsistency { .. })
    ));
    assert!(service.history(card_id).unwrap().is_empty());
}

#[test]
fn preview_and_remove_card() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let intake = service
        .add_vocabulary(Language::German, &[VocabItem::new("Berg", "mountain")], t0())
        .unwrap();
    let card_id = intake.created[0];

    let preview = service.preview(card_id, t0()).unwrap();
    let intervals: Vec<_> = preview.iter().map(|entry| entry.interval_days).collect();
    assert_eq!(intervals, vec![1, 1, 1, 1]);

    service.remove_card(card_id).unwrap();
    let err = service.remove_card(card_id).unwrap_err();
    assert!(matches!(err, ReviewServiceError::CardNotFound(_)));
}

#[test]
fn parsed_payload_flows_into_cards() {
    let mut conn = open_db_in_memory().unwrap();
    let payload = "```json\n[{\"word\": \"Stadt\", \"trans\": \"city\"}, {\"word\": \"Fluss\", \"trans\": \"river\"}]\n```";
    let items = parse_vocab_payload(payload).unwrap();

    {
        let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
        let mut service = ReviewService::new(repo);
        let intake = service
            .add_vocabulary(Language::German, &items, t0())
            .unwrap();
        assert_eq!(intake.created.len(), 2);
    }

    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let stored = repo.find_by_term(Language::German, "fluss").unwrap().unwrap();
    assert_eq!(stored.content.meaning, "river");
}

#[test]
fn returned_card_matches_stored_card_at_sub_millisecond_clock() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    let added_at = t0() + Duration::microseconds(700);
    let intake = service
        .add_vocabulary(Language::German, &[VocabItem::new("Haus", "house")], added_at)
        .unwrap();
    let card_id = intake.created[0];

    let reviewed_at = t0() + Duration::microseconds(1_400);
    let returned = service
        .submit_review(card_id, ReviewOutcome::Good, reviewed_at)
        .unwrap();
    assert_eq!(returned.last_reviewed_at, t0() + Duration::milliseconds(1));

    let cards = service.review_queue(Language::German, returned.due_at, None).unwrap();
    assert_eq!(cards, vec![returned.clone()]);

    // The stored queue and the in-memory selection agree just past due.
    let just_after = returned.due_at + Duration::microseconds(300);
    let in_memory = [returned.clone()];
    assert_eq!(due_cards(&in_memory, just_after).count(), 1);
    assert_eq!(service.due_count(Language::German, just_after).unwrap(), 1);

    let just_before = returned.due_at - Duration::microseconds(300);
    assert_eq!(due_cards(&in_memory, just_before).count(), 0);
    assert_eq!(service.due_count(Language::German, just_before).unwrap(), 0);
}

#[test]
fn custom_scheduler_config_drives_service_reviews() {
    let config = SchedulerConfig::from_json_str(
        r#"{"initial_ease": 2.0, "first_interval_days": 2, "second_interval_days": 4}"#,
    )
    .unwrap();
    let scheduler = Scheduler::new(config).unwrap();

    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::with_scheduler(repo, scheduler);

    let intake = service
        .add_vocabulary(Language::French, &[VocabItem::new("pain", "bread")], t0())
        .unwrap();
    let card_id = intake.created[0];

    let first = service
        .submit_review(card_id, ReviewOutcome::Good, t0())
        .unwrap();
    assert_eq!(first.interval_days, 2);
    assert_eq!(first.ease_factor, 2.0);

    let second = service
        .submit_review(card_id, ReviewOutcome::Good, first.due_at)
        .unwrap();
    assert_eq!(second.interval_days, 4);

    let third = service
        .submit_review(card_id, ReviewOutcome::Good, second.due_at)
        .unwrap();
    assert_eq!(third.interval_days, 8);
    assert_eq!(third.due_at, second.due_at + Duration::days(8));
}

#[test]
fn add_vocabulary_reports_skips_in_input_order() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = ReviewService::new(repo);

    service
        .add_vocabulary(Language::Spanish, &[VocabItem::new("agua", "water")], t0())
        .unwrap();

    let items = vec![
        VocabItem::new("Agua", "water"),
        VocabItem::new("fuego", "fire"),
        VocabItem::new("", "blank"),
        VocabItem::new("FUEGO", "fire again"),
    ];
    let intake = service
        .add_vocabulary(Language::Spanish, &items, t0())
        .unwrap();
    assert_eq!(intake.created.len(), 1);
    assert_eq!(
        intake.skipped,
        vec!["Agua".to_string(), String::new(), "FUEGO".to_string()]
    );
    assert_eq!(service.due_count(Language::Spanish, t0()).unwrap(), 2);
}
