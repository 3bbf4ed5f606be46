use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db::traits::MvpTally,
    db_types::{MatchRating, RatingEntry, UserStats},
};

const RATING_COLUMNS: &str = "id, match_id, rater_id, rated_id, rating, attitude_rating, participation_rating, \
                              comment, mvp_vote, created_at";

/// Has this rater already submitted a batch for this match?
pub async fn rater_has_submitted(
    match_id: i64,
    rater_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let hit: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM match_ratings WHERE match_id = $1 AND rater_id = $2 LIMIT 1")
            .bind(match_id)
            .bind(rater_id)
            .fetch_optional(conn)
            .await?;
    Ok(hit.is_some())
}

pub async fn insert_rating(
    match_id: i64,
    rater_id: i64,
    entry: &RatingEntry,
    mvp_vote: bool,
    conn: &mut SqliteConnection,
) -> Result<MatchRating, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO match_ratings (match_id, rater_id, rated_id, rating, attitude_rating, participation_rating, \
         comment, mvp_vote) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {RATING_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MatchRating>(&q)
        .bind(match_id)
        .bind(rater_id)
        .bind(entry.rated_id)
        .bind(entry.overall())
        .bind(entry.attitude_rating)
        .bind(entry.participation_rating)
        .bind(entry.comment.as_deref())
        .bind(mvp_vote)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn fetch_ratings_for_match(
    match_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<MatchRating>, SqliteDatabaseError> {
    let q = format!("SELECT {RATING_COLUMNS} FROM match_ratings WHERE match_id = $1 ORDER BY id");
    let ratings = sqlx::query_as::<_, MatchRating>(&q).bind(match_id).fetch_all(conn).await?;
    Ok(ratings)
}

/// Full recompute of a user's aggregate from every rating they have ever received. `total_matches` is
/// derived as the number of distinct rated matches rather than kept as an incremental counter.
pub async fn recompute_stats(user_id: i64, conn: &mut SqliteConnection) -> Result<UserStats, SqliteDatabaseError> {
    let stats = sqlx::query_as::<_, UserStats>(
        "SELECT $1 AS user_id, \
                COUNT(DISTINCT match_id) AS total_matches, \
                ROUND(COALESCE(AVG(rating), 0), 2) AS average_rating, \
                ROUND(COALESCE(AVG(attitude_rating), 0), 2) AS average_attitude, \
                ROUND(COALESCE(AVG(participation_rating), 0), 2) AS average_participation, \
                (SELECT COUNT(*) FROM mvp_awards WHERE user_id = $1) AS mvp_count \
         FROM match_ratings WHERE rated_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query(
        "INSERT INTO user_stats (user_id, total_matches, average_rating, average_attitude, average_participation, \
         mvp_count) VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET total_matches = excluded.total_matches, \
         average_rating = excluded.average_rating, average_attitude = excluded.average_attitude, \
         average_participation = excluded.average_participation, mvp_count = excluded.mvp_count",
    )
    .bind(user_id)
    .bind(stats.total_matches)
    .bind(stats.average_rating)
    .bind(stats.average_attitude)
    .bind(stats.average_participation)
    .bind(stats.mvp_count)
    .execute(conn)
    .await?;
    trace!("📊️ Recomputed stats for user {user_id}: {stats:?}");
    Ok(stats)
}

pub async fn fetch_stats(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserStats>, SqliteDatabaseError> {
    let stats = sqlx::query_as::<_, UserStats>(
        "SELECT user_id, total_matches, average_rating, average_attitude, average_participation, mvp_count \
         FROM user_stats WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(stats)
}

pub async fn mvp_tallies(match_id: i64, conn: &mut SqliteConnection) -> Result<Vec<MvpTally>, SqliteDatabaseError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT rated_id, COUNT(*) FROM match_ratings WHERE match_id = $1 AND mvp_vote = 1 \
         GROUP BY rated_id ORDER BY COUNT(*) DESC",
    )
    .bind(match_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(user_id, votes)| MvpTally { user_id, votes }).collect())
}

/// Insert the award marker. The primary key makes this the once-only guard for MVP congratulations.
pub async fn record_mvp_award(
    match_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query("INSERT OR IGNORE INTO mvp_awards (match_id, user_id) VALUES ($1, $2)")
        .bind(match_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() == 1)
}
