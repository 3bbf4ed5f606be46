use chrono::{NaiveDate, NaiveTime};
use cnc_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{BookingStatus, DailyMatch, MatchPlayer, MatchStatus, MatchTeam, NewMatch, SeatPayment},
};

const MATCH_COLUMNS: &str = "id, name, field_id, game_type, schedule_date, start_time, end_time, price, \
                             max_players, player_count, status, created_at, updated_at";

pub async fn fetch_match(match_id: i64, conn: &mut SqliteConnection) -> Result<Option<DailyMatch>, SqliteDatabaseError> {
    let q = format!("SELECT {MATCH_COLUMNS} FROM daily_matches WHERE id = $1");
    let game = sqlx::query_as::<_, DailyMatch>(&q).bind(match_id).fetch_optional(conn).await?;
    Ok(game)
}

/// Whether a confirmed booking already occupies this hour on this field.
pub async fn booking_overlaps(
    field_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let hit: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM field_bookings WHERE field_id = $1 AND booking_date = $2 AND status = $3 AND \
         start_time < $5 AND end_time > $4 LIMIT 1",
    )
    .bind(field_id)
    .bind(date)
    .bind(BookingStatus::Confirmed)
    .bind(start)
    .bind(start + chrono::Duration::hours(1))
    .fetch_optional(conn)
    .await?;
    Ok(hit.is_some())
}

/// Whether a match already exists for this exact field + date + hour.
pub async fn slot_taken(
    field_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let hit: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM daily_matches WHERE field_id = $1 AND schedule_date = $2 AND start_time = $3")
            .bind(field_id)
            .bind(date)
            .bind(start)
            .fetch_optional(conn)
            .await?;
    Ok(hit.is_some())
}

pub async fn insert_booking(
    field_id: i64,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO field_bookings (field_id, booking_date, start_time, end_time, status) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(field_id)
    .bind(date)
    .bind(start)
    .bind(end)
    .bind(BookingStatus::Confirmed)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn cancel_booking_for_match(match_id: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        "UPDATE field_bookings SET status = $1 WHERE id = (SELECT booking_id FROM daily_matches WHERE id = $2)",
    )
    .bind(BookingStatus::Cancelled)
    .bind(match_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_match(
    new_match: &NewMatch,
    booking_id: i64,
    conn: &mut SqliteConnection,
) -> Result<DailyMatch, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO daily_matches (name, field_id, game_type, schedule_date, start_time, end_time, price, \
         max_players, booking_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {MATCH_COLUMNS}"
    );
    let game = sqlx::query_as::<_, DailyMatch>(&q)
        .bind(&new_match.name)
        .bind(new_match.field_id)
        .bind(new_match.game_type)
        .bind(new_match.schedule_date)
        .bind(new_match.start_time)
        .bind(new_match.end_time)
        .bind(new_match.price)
        .bind(new_match.game_type.match_capacity())
        .bind(booking_id)
        .fetch_one(conn)
        .await?;
    Ok(game)
}

pub async fn insert_team(
    match_id: i64,
    name: &str,
    color: &str,
    emoji: &str,
    max_players: i64,
    conn: &mut SqliteConnection,
) -> Result<MatchTeam, SqliteDatabaseError> {
    let team = sqlx::query_as::<_, MatchTeam>(
        "INSERT INTO match_teams (match_id, name, color, emoji, max_players) VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, match_id, name, color, emoji, player_count, max_players",
    )
    .bind(match_id)
    .bind(name)
    .bind(color)
    .bind(emoji)
    .bind(max_players)
    .fetch_one(conn)
    .await?;
    Ok(team)
}

pub async fn fetch_teams(match_id: i64, conn: &mut SqliteConnection) -> Result<Vec<MatchTeam>, SqliteDatabaseError> {
    let teams = sqlx::query_as::<_, MatchTeam>(
        "SELECT id, match_id, name, color, emoji, player_count, max_players FROM match_teams \
         WHERE match_id = $1 ORDER BY id",
    )
    .bind(match_id)
    .fetch_all(conn)
    .await?;
    Ok(teams)
}

pub async fn fetch_team(team_id: i64, conn: &mut SqliteConnection) -> Result<Option<MatchTeam>, SqliteDatabaseError> {
    let team = sqlx::query_as::<_, MatchTeam>(
        "SELECT id, match_id, name, color, emoji, player_count, max_players FROM match_teams WHERE id = $1",
    )
    .bind(team_id)
    .fetch_optional(conn)
    .await?;
    Ok(team)
}

const MEMBER_COLUMNS: &str = "id, match_id, player_id, team_id, position, payment_status, payment_id, amount, \
                              created_at";

pub async fn fetch_roster(match_id: i64, conn: &mut SqliteConnection) -> Result<Vec<MatchPlayer>, SqliteDatabaseError> {
    let q = format!("SELECT {MEMBER_COLUMNS} FROM match_players WHERE match_id = $1 ORDER BY id");
    let roster = sqlx::query_as::<_, MatchPlayer>(&q).bind(match_id).fetch_all(conn).await?;
    Ok(roster)
}

pub async fn fetch_membership(
    match_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchPlayer>, SqliteDatabaseError> {
    let q = format!("SELECT {MEMBER_COLUMNS} FROM match_players WHERE match_id = $1 AND player_id = $2");
    let seat = sqlx::query_as::<_, MatchPlayer>(&q).bind(match_id).bind(user_id).fetch_optional(conn).await?;
    Ok(seat)
}

pub async fn fetch_membership_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MatchPlayer>, SqliteDatabaseError> {
    let q = format!("SELECT {MEMBER_COLUMNS} FROM match_players WHERE payment_id = $1");
    let seat = sqlx::query_as::<_, MatchPlayer>(&q).bind(payment_id).fetch_optional(conn).await?;
    Ok(seat)
}

/// Conditional capacity increment. Returns `false` when the team is already full, which is the
/// race-safe "team full" signal: two concurrent joins cannot both pass it.
pub async fn try_increment_team_count(team_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query("UPDATE match_teams SET player_count = player_count + 1 WHERE id = $1 AND player_count < max_players")
        .bind(team_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() == 1)
}

/// Conditional match-level increment; also re-asserts that the match is still open.
pub async fn try_increment_match_count(
    match_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query(
        "UPDATE daily_matches SET player_count = player_count + 1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND status = $2 AND player_count < max_players",
    )
    .bind(match_id)
    .bind(MatchStatus::Open)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Flip a match that just reached capacity from `Open` to `Confirmed`.
pub async fn confirm_if_full(match_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query(
        "UPDATE daily_matches SET status = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = $3 AND player_count >= max_players",
    )
    .bind(MatchStatus::Confirmed)
    .bind(match_id)
    .bind(MatchStatus::Open)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Reopen a confirmed match that lost a player, so the freed seat can be taken again.
pub async fn reopen_if_unfilled(match_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query(
        "UPDATE daily_matches SET status = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = $3 AND player_count < max_players",
    )
    .bind(MatchStatus::Open)
    .bind(match_id)
    .bind(MatchStatus::Confirmed)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn decrement_counts(
    match_id: i64,
    team_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE match_teams SET player_count = player_count - 1 WHERE id = $1 AND player_count > 0")
        .bind(team_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "UPDATE daily_matches SET player_count = player_count - 1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND player_count > 0",
    )
    .bind(match_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_member(
    match_id: i64,
    team_id: i64,
    user_id: i64,
    position: Option<&str>,
    payment_status: SeatPayment,
    payment_id: Option<&str>,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<MatchPlayer, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO match_players (match_id, player_id, team_id, position, payment_status, payment_id, amount) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {MEMBER_COLUMNS}"
    );
    let seat = sqlx::query_as::<_, MatchPlayer>(&q)
        .bind(match_id)
        .bind(user_id)
        .bind(team_id)
        .bind(position)
        .bind(payment_status)
        .bind(payment_id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
    trace!("🏟️ Player {user_id} seated in match {match_id}, team {team_id}");
    Ok(seat)
}

pub async fn delete_member(match_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query("DELETE FROM match_players WHERE match_id = $1 AND player_id = $2")
        .bind(match_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn set_match_status(
    match_id: i64,
    status: MatchStatus,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE daily_matches SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(match_id)
        .execute(conn)
        .await?;
    Ok(())
}
