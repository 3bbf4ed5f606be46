mod support;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cnc_common::Money;

use canchita_engine::{
    db_types::MatchStatus,
    events::EventProducers,
    JoinOutcome,
    LifecycleApi,
    LifecycleManagement,
    MatchManagement,
    SqliteDatabase,
    WalletManagement,
};
use support::{prepare_test_env, random_db_path, register_token, seed_field, seed_match, seed_users};

fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

fn at(time: (u32, u32)) -> DateTime<Utc> {
    fixed_date().and_hms_opt(time.0, time.1, 0).unwrap().and_utc()
}

fn api(db: &SqliteDatabase) -> LifecycleApi<SqliteDatabase> {
    LifecycleApi::new(db.clone(), EventProducers::default())
}

#[tokio::test]
async fn underfilled_match_is_cancelled_and_everyone_refunded_once() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 1").await;
    let users = seed_users(&db, 3).await;
    let created = seed_match(&db, field, fixed_date(), six_pm()).await;
    let match_id = created.game.id;
    let price = created.game.price;
    let api = api(&db);

    for (i, user) in users.iter().enumerate() {
        let team = created.teams[i % 2].id;
        assert!(matches!(db.join_match(match_id, team, *user).await.unwrap(), JoinOutcome::Joined(_)));
        register_token(&db, *user, &format!("token-{user}")).await;
    }

    // 17:30, kickoff within the hour, three of ten seats taken.
    let reports = api.run_cancellation_sweep(at((17, 30))).await.unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.game.id, match_id);
    assert_eq!(report.refunds.len(), 3);
    assert_eq!(report.recipient_tokens.len(), 3);

    let game = db.fetch_match(match_id).await.unwrap().unwrap();
    assert_eq!(game.status, MatchStatus::Cancelled);
    for user in &users {
        assert_eq!(db.fetch_wallet(*user).await.unwrap().unwrap().balance, price);
    }
    let booking_status: String = sqlx::query_scalar("SELECT status FROM field_bookings WHERE field_id = $1")
        .bind(field)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(booking_status, "Cancelled");

    // A second sweep finds nothing, and even a direct retry refunds nobody twice.
    assert!(api.run_cancellation_sweep(at((17, 31))).await.unwrap().is_empty());
    let retry = db.cancel_match_with_refunds(match_id).await.unwrap();
    assert!(retry.refunds.is_empty());
    for user in &users {
        assert_eq!(db.fetch_wallet(*user).await.unwrap().unwrap().balance, price);
    }
}

#[tokio::test]
async fn full_and_out_of_window_matches_are_left_alone() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 2").await;
    let users = seed_users(&db, 10).await;
    let full = seed_match(&db, field, fixed_date(), six_pm()).await;
    let later = seed_match(&db, field, fixed_date(), NaiveTime::from_hms_opt(21, 0, 0).unwrap()).await;
    let api = api(&db);

    for (i, user) in users.iter().enumerate() {
        let team = full.teams[i % 2].id;
        assert!(matches!(db.join_match(full.game.id, team, *user).await.unwrap(), JoinOutcome::Joined(_)));
    }

    let reports = api.run_cancellation_sweep(at((17, 30))).await.unwrap();
    assert!(reports.is_empty(), "a full match and a far-future match are not candidates");
    assert_eq!(db.fetch_match(full.game.id).await.unwrap().unwrap().status, MatchStatus::Open);
    assert_eq!(db.fetch_match(later.game.id).await.unwrap().unwrap().status, MatchStatus::Open);

    // The empty 21:00 match becomes a candidate once its hour approaches.
    let reports = api.run_cancellation_sweep(at((20, 15))).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].game.id, later.game.id);
    assert!(reports[0].refunds.is_empty(), "nobody had joined, nobody is refunded");
}

#[tokio::test]
async fn matches_kicking_off_just_before_midnight_are_still_candidates() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha nocturna").await;
    let created = seed_match(&db, field, fixed_date(), NaiveTime::from_hms_opt(23, 45, 0).unwrap()).await;
    let api = api(&db);

    // The look-ahead window crosses midnight here; the 23:45 kickoff must not escape it.
    let reports = api.run_cancellation_sweep(at((23, 30))).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].game.id, created.game.id);
    assert_eq!(db.fetch_match(created.game.id).await.unwrap().unwrap().status, MatchStatus::Cancelled);
}

#[tokio::test]
async fn reminders_fire_once_an_hour_before_kickoff() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 3").await;
    let users = seed_users(&db, 2).await;
    let created = seed_match(&db, field, fixed_date(), six_pm()).await;
    let api = api(&db);

    for (i, user) in users.iter().enumerate() {
        let team = created.teams[i % 2].id;
        assert!(matches!(db.join_match(created.game.id, team, *user).await.unwrap(), JoinOutcome::Joined(_)));
        register_token(&db, *user, &format!("token-{user}")).await;
    }

    // 16:30: the 17:00 reminder is not due yet.
    assert_eq!(api.run_reminder_sweep(at((16, 30))).await.unwrap(), 0);

    let due = db.due_reminders(at((17, 5))).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].game.id, created.game.id);
    assert_eq!(due[0].recipient_tokens.len(), 2);

    assert_eq!(api.run_reminder_sweep(at((17, 5))).await.unwrap(), 1);
    // Marked sent; the next sweep is quiet.
    assert_eq!(api.run_reminder_sweep(at((17, 6))).await.unwrap(), 0);
}

#[tokio::test]
async fn refund_uses_the_match_price_at_cancellation() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 4").await;
    let users = seed_users(&db, 1).await;
    let created = seed_match(&db, field, fixed_date(), six_pm()).await;
    let api = api(&db);

    assert!(matches!(
        db.join_match(created.game.id, created.teams[0].id, users[0]).await.unwrap(),
        JoinOutcome::Joined(_)
    ));
    let reports = api.run_cancellation_sweep(at((17, 45))).await.unwrap();
    assert_eq!(reports[0].refunds, vec![(users[0], Money::from_units(50))]);
}
