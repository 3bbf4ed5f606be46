//! Shared harness for the engine integration tests: a throwaway SQLite file per test, migrations, and
//! seed helpers for the rows the engine treats as externally owned (users, fields, device tokens).

use chrono::{NaiveDate, NaiveTime};
use cnc_common::Money;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use canchita_engine::{
    db_types::{GameType, NewMatch},
    helpers::slot_end,
    CreatedMatch,
    MatchManagement,
    SqliteDatabase,
};

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_canchita_{}.db", rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    std::fs::create_dir_all("../data").expect("Error creating test data directory");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn seed_user(db: &SqliteDatabase, name: &str) -> i64 {
    let res = sqlx::query("INSERT INTO users (display_name) VALUES ($1)")
        .bind(name)
        .execute(db.pool())
        .await
        .expect("Error seeding user");
    res.last_insert_rowid()
}

pub async fn seed_users(db: &SqliteDatabase, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(seed_user(db, &format!("player_{i}")).await);
    }
    ids
}

pub async fn seed_field(db: &SqliteDatabase, name: &str) -> i64 {
    let res =
        sqlx::query("INSERT INTO fields (name) VALUES ($1)").bind(name).execute(db.pool()).await.expect("Error seeding field");
    res.last_insert_rowid()
}

pub async fn register_token(db: &SqliteDatabase, user_id: i64, token: &str) {
    sqlx::query("INSERT OR IGNORE INTO device_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token)
        .execute(db.pool())
        .await
        .expect("Error registering device token");
}

/// Create one Fut5 match at the given date and time via the normal creation flow.
pub async fn seed_match(db: &SqliteDatabase, field_id: i64, date: NaiveDate, start: NaiveTime) -> CreatedMatch {
    let new_match = NewMatch {
        name: "Test match".to_string(),
        field_id,
        game_type: GameType::Fut5,
        schedule_date: date,
        start_time: start,
        end_time: slot_end(start),
        price: Money::from_units(50),
    };
    match db.create_match_slot(new_match).await.expect("Error creating match") {
        canchita_engine::BatchSlotOutcome::Created(created) => created,
        other => panic!("Slot was not free: {other:?}"),
    }
}

/// Force an order into the completed state without going through the payment funnel.
pub async fn force_complete_order(db: &SqliteDatabase, order_id: i64) {
    sqlx::query("UPDATE orders SET status = 'Completed' WHERE id = $1")
        .bind(order_id)
        .execute(db.pool())
        .await
        .expect("Error completing order");
}
