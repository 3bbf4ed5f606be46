use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::NotificationEvent};

pub async fn insert_event(
    match_id: i64,
    event_type: &str,
    scheduled_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<NotificationEvent, SqliteDatabaseError> {
    let event = sqlx::query_as::<_, NotificationEvent>(
        "INSERT INTO notification_events (match_id, event_type, scheduled_at) VALUES ($1, $2, $3) \
         RETURNING id, match_id, event_type, scheduled_at, is_sent",
    )
    .bind(match_id)
    .bind(event_type)
    .bind(scheduled_at)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

pub async fn due_events(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<NotificationEvent>, SqliteDatabaseError> {
    let events = sqlx::query_as::<_, NotificationEvent>(
        "SELECT id, match_id, event_type, scheduled_at, is_sent FROM notification_events \
         WHERE is_sent = 0 AND scheduled_at <= $1 ORDER BY scheduled_at",
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(events)
}

pub async fn mark_sent(event_id: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE notification_events SET is_sent = 1 WHERE id = $1").bind(event_id).execute(conn).await?;
    Ok(())
}

/// Device tokens for every member of a match roster, optionally excluding one user (typically the actor
/// who triggered the notification).
pub async fn roster_tokens(
    match_id: i64,
    except_user: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, SqliteDatabaseError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT d.token FROM device_tokens d JOIN match_players p ON p.player_id = d.user_id \
         WHERE p.match_id = $1 AND ($2 IS NULL OR d.user_id <> $2)",
    )
    .bind(match_id)
    .bind(except_user)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}

pub async fn user_tokens(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<String>, SqliteDatabaseError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT token FROM device_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}

pub async fn register_token(user_id: i64, token: &str, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("INSERT OR IGNORE INTO device_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token)
        .execute(conn)
        .await?;
    Ok(())
}
