mod support;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use canchita_engine::{
    db_types::RatingEntry,
    events::EventProducers,
    JoinOutcome,
    MatchManagement,
    RatingApi,
    RatingApiError,
    RatingManagement,
    RatingSubmitOutcome,
    SqliteDatabase,
};
use support::{prepare_test_env, random_db_path, seed_field, seed_match, seed_users};

fn match_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

fn day_after() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 6, 11).unwrap().and_hms_opt(10, 0, 0).unwrap().and_utc()
}

fn entry(rated_id: i64, attitude: i64, participation: i64) -> RatingEntry {
    RatingEntry { rated_id, attitude_rating: attitude, participation_rating: participation, comment: None }
}

fn api(db: &SqliteDatabase) -> RatingApi<SqliteDatabase> {
    RatingApi::new(db.clone(), EventProducers::default())
}

/// Four players on a finished match; returns (match_id, players).
async fn finished_match(db: &SqliteDatabase, field_name: &str) -> (i64, Vec<i64>) {
    let field = seed_field(db, field_name).await;
    let users = seed_users(db, 4).await;
    let created = seed_match(db, field, match_date(), six_pm()).await;
    for (i, user) in users.iter().enumerate() {
        let team = created.teams[i % 2].id;
        assert!(matches!(db.join_match(created.game.id, team, *user).await.unwrap(), JoinOutcome::Joined(_)));
    }
    (created.game.id, users)
}

#[tokio::test]
async fn submission_preconditions() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let (match_id, users) = finished_match(&db, "Cancha 1").await;
    let api = api(&db);
    let [a, b, c, _d] = [users[0], users[1], users[2], users[3]];
    let batch = vec![entry(b, 4, 4), entry(c, 3, 5)];

    // Still playing at 18:30.
    let during = match_date().and_hms_opt(18, 30, 0).unwrap().and_utc();
    let outcome = api.submit_ratings(match_id, a, &batch, b, during).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::MatchNotFinished));

    let outcome = api.submit_ratings(9999, a, &batch, b, day_after()).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::MatchNotFound));

    let outsider = seed_users(&db, 1).await[0];
    let outcome = api.submit_ratings(match_id, outsider, &batch, b, day_after()).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::NotParticipant));

    let err = api.submit_ratings(match_id, a, &[entry(b, 6, 4)], b, day_after()).await.unwrap_err();
    assert!(matches!(err, RatingApiError::InvalidRating(_)));

    let outcome = api.submit_ratings(match_id, a, &batch, b, day_after()).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::Submitted { inserted: 2 }));
    // One batch per rater per match.
    let outcome = api.submit_ratings(match_id, a, &[entry(c, 5, 5)], c, day_after()).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::AlreadyRated));
    assert_eq!(api.ratings_for_match(match_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn self_ratings_and_stray_mvp_votes_are_rejected() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let (match_id, users) = finished_match(&db, "Cancha 5").await;
    let api = api(&db);
    let [a, b, c, _d] = [users[0], users[1], users[2], users[3]];

    // Rating yourself.
    let err = api.submit_ratings(match_id, a, &[entry(a, 5, 5)], a, day_after()).await.unwrap_err();
    assert!(matches!(err, RatingApiError::SelfRating(_)));
    // Voting yourself MVP.
    let err = api.submit_ratings(match_id, a, &[entry(b, 4, 4)], a, day_after()).await.unwrap_err();
    assert!(matches!(err, RatingApiError::InvalidMvpVote(_)));
    // Voting for a player the batch does not rate.
    let err = api.submit_ratings(match_id, a, &[entry(b, 4, 4)], c, day_after()).await.unwrap_err();
    assert!(matches!(err, RatingApiError::InvalidMvpVote(_)));

    // Rejected batches leave no rating rows and no award.
    assert!(api.ratings_for_match(match_id).await.unwrap().is_empty());
    let awarded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mvp_awards").fetch_one(db.pool()).await.unwrap();
    assert_eq!(awarded, 0);

    let outcome = api.submit_ratings(match_id, a, &[entry(b, 4, 4)], b, day_after()).await.unwrap();
    assert!(matches!(outcome, RatingSubmitOutcome::Submitted { inserted: 1 }));
}

#[tokio::test]
async fn stats_recompute_from_received_ratings() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let (match_id, users) = finished_match(&db, "Cancha 2").await;
    let api = api(&db);
    let [a, b, c, d] = [users[0], users[1], users[2], users[3]];

    // B receives (5,4) -> 5, (4,4) -> 4 and (3,5) -> 4.
    api.submit_ratings(match_id, a, &[entry(b, 5, 4)], b, day_after()).await.unwrap();
    api.submit_ratings(match_id, c, &[entry(b, 4, 4)], b, day_after()).await.unwrap();
    api.submit_ratings(match_id, d, &[entry(b, 3, 5)], b, day_after()).await.unwrap();

    let stats = api.stats(b).await.unwrap();
    assert_eq!(stats.total_matches, 1);
    assert!((stats.average_rating - 4.33).abs() < 1e-6);
    assert!((stats.average_attitude - 4.0).abs() < 1e-6);
    assert!((stats.average_participation - 4.33).abs() < 1e-6);

    // Nobody rated D; the aggregate exists and is zeroed.
    let stats = api.stats(d).await.unwrap();
    assert_eq!(stats.total_matches, 0);
    assert_eq!(stats.average_rating, 0.0);
}

#[tokio::test]
async fn total_matches_counts_distinct_matches() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 3").await;
    let users = seed_users(&db, 2).await;
    let [a, b] = [users[0], users[1]];
    let api = api(&db);

    let m1 = seed_match(&db, field, match_date(), six_pm()).await;
    let m2 = seed_match(&db, field, match_date(), NaiveTime::from_hms_opt(20, 0, 0).unwrap()).await;
    for m in [&m1, &m2] {
        assert!(matches!(db.join_match(m.game.id, m.teams[0].id, a).await.unwrap(), JoinOutcome::Joined(_)));
        assert!(matches!(db.join_match(m.game.id, m.teams[1].id, b).await.unwrap(), JoinOutcome::Joined(_)));
    }

    api.submit_ratings(m1.game.id, a, &[entry(b, 4, 4)], b, day_after()).await.unwrap();
    api.submit_ratings(m2.game.id, a, &[entry(b, 5, 5)], b, day_after()).await.unwrap();

    let stats = api.stats(b).await.unwrap();
    assert_eq!(stats.total_matches, 2, "two distinct rated matches, not two rating rows");
}

#[tokio::test]
async fn mvp_award_fires_at_threshold_and_only_once() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let (match_id, users) = finished_match(&db, "Cancha 4").await;
    let api = api(&db);
    let [a, b, c, d] = [users[0], users[1], users[2], users[3]];

    // Four participants: threshold is ceil(0.75 * 4) = 3 votes.
    api.submit_ratings(match_id, a, &[entry(b, 5, 5)], b, day_after()).await.unwrap();
    api.submit_ratings(match_id, c, &[entry(b, 4, 4)], b, day_after()).await.unwrap();
    let awarded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mvp_awards").fetch_one(db.pool()).await.unwrap();
    assert_eq!(awarded, 0, "two votes are below the threshold");

    api.submit_ratings(match_id, d, &[entry(b, 4, 5)], b, day_after()).await.unwrap();
    let awarded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mvp_awards").fetch_one(db.pool()).await.unwrap();
    assert_eq!(awarded, 1);
    assert_eq!(api.stats(b).await.unwrap().mvp_count, 1);

    // The award is recorded; later activity can never congratulate B again for this match.
    assert!(!db.record_mvp_award(match_id, b).await.unwrap());
    api.submit_ratings(match_id, b, &[entry(a, 4, 4)], a, day_after()).await.unwrap();
    let awarded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mvp_awards").fetch_one(db.pool()).await.unwrap();
    assert_eq!(awarded, 1);
}
