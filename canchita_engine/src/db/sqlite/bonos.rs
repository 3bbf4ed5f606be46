use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::UserBono};

const BONO_COLUMNS: &str = "id, user_id, bono_type, matches_remaining, expires_at, payment_id, created_at";

pub async fn fetch_bono(bono_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserBono>, SqliteDatabaseError> {
    let q = format!("SELECT {BONO_COLUMNS} FROM user_bonos WHERE id = $1");
    let bono = sqlx::query_as::<_, UserBono>(&q).bind(bono_id).fetch_optional(conn).await?;
    Ok(bono)
}

pub async fn fetch_bono_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserBono>, SqliteDatabaseError> {
    let q = format!("SELECT {BONO_COLUMNS} FROM user_bonos WHERE payment_id = $1");
    let bono = sqlx::query_as::<_, UserBono>(&q).bind(payment_id).fetch_optional(conn).await?;
    Ok(bono)
}

pub async fn insert_bono(
    user_id: i64,
    bono_type: &str,
    entries: i64,
    valid_days: i64,
    payment_id: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<UserBono, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO user_bonos (user_id, bono_type, matches_remaining, expires_at, payment_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {BONO_COLUMNS}"
    );
    let bono = sqlx::query_as::<_, UserBono>(&q)
        .bind(user_id)
        .bind(bono_type)
        .bind(entries)
        .bind(now + Duration::days(valid_days))
        .bind(payment_id)
        .fetch_one(conn)
        .await?;
    Ok(bono)
}

/// Consume one entry. The conditional update is the exhaustion guard: it only fires while entries remain.
pub async fn consume_entry(bono_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query(
        "UPDATE user_bonos SET matches_remaining = matches_remaining - 1 WHERE id = $1 AND matches_remaining > 0",
    )
    .bind(bono_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}
