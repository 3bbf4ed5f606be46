use chrono::{DateTime, Utc};

use crate::db::traits::{MvpTally, RatingSubmitOutcome};
use crate::db_types::{MatchRating, RatingEntry, UserStats};

/// Rating and reputation aggregation contract.
#[allow(async_fn_in_trait)]
pub trait RatingManagement: Clone {
    type Error: std::error::Error;

    /// Store one rater's batch for a match in a single transaction. A second batch from the same rater
    /// for the same match is rejected with `AlreadyRated` and leaves the rating rows unchanged.
    /// Participation and match-finished preconditions are checked inside the same call.
    async fn submit_rating_batch(
        &self,
        match_id: i64,
        rater_id: i64,
        entries: &[RatingEntry],
        mvp_vote: i64,
        now: DateTime<Utc>,
    ) -> Result<RatingSubmitOutcome, Self::Error>;

    async fn fetch_ratings_for_match(&self, match_id: i64) -> Result<Vec<MatchRating>, Self::Error>;

    /// Full recompute of a user's aggregate from their entire rating history. `total_matches` is derived
    /// as the count of distinct rated matches.
    async fn recompute_stats(&self, user_id: i64) -> Result<UserStats, Self::Error>;

    async fn fetch_stats(&self, user_id: i64) -> Result<Option<UserStats>, Self::Error>;

    /// MVP votes per candidate among all ratings submitted so far for the match.
    async fn mvp_tallies(&self, match_id: i64) -> Result<Vec<MvpTally>, Self::Error>;

    /// Record that a candidate was congratulated for this match. Returns `false` if the award was already
    /// recorded, which is the duplicate-congratulation guard.
    async fn record_mvp_award(&self, match_id: i64, user_id: i64) -> Result<bool, Self::Error>;

    /// Device tokens registered by one user, for addressing the MVP congratulation.
    async fn user_device_tokens(&self, user_id: i64) -> Result<Vec<String>, Self::Error>;
}
