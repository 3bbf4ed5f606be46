mod support;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use futures_util::future::join_all;

use canchita_engine::{db_types::MatchStatus, JoinOutcome, LeaveOutcome, MatchManagement, SqliteDatabase};
use support::{prepare_test_env, random_db_path, seed_field, seed_match, seed_users};

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

#[tokio::test]
async fn capacity_is_never_exceeded() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "La Bombonerita").await;
    let users = seed_users(&db, 12).await;
    let created = seed_match(&db, field, tomorrow(), six_pm()).await;
    let match_id = created.game.id;
    let [team_a, team_b] = created.teams;

    // Fut5: ten seats, five per side.
    for (i, user) in users.iter().take(10).enumerate() {
        let team = if i % 2 == 0 { team_a.id } else { team_b.id };
        let outcome = db.join_match(match_id, team, *user).await.unwrap();
        assert!(matches!(outcome, JoinOutcome::Joined(_)), "user {user} should get seat {i}");
    }
    // The tenth seat confirmed the match, so latecomers bounce off the status check.
    for user in &users[10..] {
        let a = db.join_match(match_id, team_a.id, *user).await.unwrap();
        let b = db.join_match(match_id, team_b.id, *user).await.unwrap();
        assert!(matches!(a, JoinOutcome::MatchNotOpen));
        assert!(matches!(b, JoinOutcome::MatchNotOpen));
    }

    let game = db.fetch_match(match_id).await.unwrap().unwrap();
    assert_eq!(game.player_count, 10);
    assert!(game.is_full());
    assert_eq!(game.status, MatchStatus::Confirmed);
    let teams = db.fetch_teams(match_id).await.unwrap();
    for team in teams {
        assert_eq!(team.player_count, 5);
    }
    assert_eq!(db.fetch_roster(match_id).await.unwrap().len(), 10);
}

#[tokio::test]
async fn duplicate_join_is_rejected() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "El Monumentalito").await;
    let users = seed_users(&db, 1).await;
    let created = seed_match(&db, field, tomorrow(), six_pm()).await;
    let match_id = created.game.id;
    let [team_a, team_b] = created.teams;

    let first = db.join_match(match_id, team_a.id, users[0]).await.unwrap();
    assert!(matches!(first, JoinOutcome::Joined(_)));
    // Same team and the other team both count as the same membership.
    let again = db.join_match(match_id, team_a.id, users[0]).await.unwrap();
    assert!(matches!(again, JoinOutcome::AlreadyJoined));
    let other_team = db.join_match(match_id, team_b.id, users[0]).await.unwrap();
    assert!(matches!(other_team, JoinOutcome::AlreadyJoined));

    let game = db.fetch_match(match_id).await.unwrap().unwrap();
    assert_eq!(game.player_count, 1);
}

#[tokio::test]
async fn leaving_frees_the_seat() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 3").await;
    let users = seed_users(&db, 2).await;
    let created = seed_match(&db, field, tomorrow(), six_pm()).await;
    let match_id = created.game.id;
    let team = created.teams[0].id;

    assert!(matches!(db.join_match(match_id, team, users[0]).await.unwrap(), JoinOutcome::Joined(_)));
    assert!(matches!(db.leave_match(match_id, users[0]).await.unwrap(), LeaveOutcome::Left));
    assert!(matches!(db.leave_match(match_id, users[0]).await.unwrap(), LeaveOutcome::NotJoined));

    let game = db.fetch_match(match_id).await.unwrap().unwrap();
    assert_eq!(game.player_count, 0);
    // The freed seat is available to someone else.
    assert!(matches!(db.join_match(match_id, team, users[1]).await.unwrap(), JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn a_match_confirms_at_capacity_and_reopens_when_a_seat_frees() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 6").await;
    let users = seed_users(&db, 11).await;
    let created = seed_match(&db, field, tomorrow(), six_pm()).await;
    let match_id = created.game.id;
    let [team_a, team_b] = created.teams;

    for (i, user) in users.iter().take(10).enumerate() {
        let team = if i % 2 == 0 { team_a.id } else { team_b.id };
        assert!(matches!(db.join_match(match_id, team, *user).await.unwrap(), JoinOutcome::Joined(_)));
    }
    assert_eq!(db.fetch_match(match_id).await.unwrap().unwrap().status, MatchStatus::Confirmed);

    // A departure reopens the match and the freed seat is claimable again.
    assert!(matches!(db.leave_match(match_id, users[0]).await.unwrap(), LeaveOutcome::Left));
    assert_eq!(db.fetch_match(match_id).await.unwrap().unwrap().status, MatchStatus::Open);
    assert!(matches!(db.join_match(match_id, team_a.id, users[10]).await.unwrap(), JoinOutcome::Joined(_)));
    assert_eq!(db.fetch_match(match_id).await.unwrap().unwrap().status, MatchStatus::Confirmed);
}

#[tokio::test]
async fn team_must_belong_to_the_match() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 4").await;
    let users = seed_users(&db, 1).await;
    let m1 = seed_match(&db, field, tomorrow(), six_pm()).await;
    let m2 = seed_match(&db, field, tomorrow(), NaiveTime::from_hms_opt(20, 0, 0).unwrap()).await;

    let outcome = db.join_match(m1.game.id, m2.teams[0].id, users[0]).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::TeamMismatch));
    assert_eq!(db.fetch_match(m1.game.id).await.unwrap().unwrap().player_count, 0);
}

#[tokio::test]
async fn racing_joins_cannot_oversubscribe() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let field = seed_field(&db, "Cancha 5").await;
    let users = seed_users(&db, 14).await;
    let created = seed_match(&db, field, tomorrow(), six_pm()).await;
    let match_id = created.game.id;
    let [team_a, team_b] = created.teams;

    // One connection forces the transactions to interleave through the pool while the tasks race.
    let racing_db = SqliteDatabase::new_with_url(&url, 1).await.unwrap();
    let tasks = users.iter().enumerate().map(|(i, user)| {
        let db = racing_db.clone();
        let team = if i % 2 == 0 { team_a.id } else { team_b.id };
        let user = *user;
        tokio::spawn(async move { db.join_match(match_id, team, user).await.unwrap() })
    });
    let outcomes: Vec<JoinOutcome> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let joined = outcomes.iter().filter(|o| matches!(o, JoinOutcome::Joined(_))).count();
    assert_eq!(joined, 10, "exactly ten racers should win a seat");
    let game = db.fetch_match(match_id).await.unwrap().unwrap();
    assert_eq!(game.player_count, 10);
    for team in db.fetch_teams(match_id).await.unwrap() {
        assert_eq!(team.player_count, 5);
    }
}
