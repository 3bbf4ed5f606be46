use chrono::{DateTime, Utc};

use crate::db::traits::{BatchSlotOutcome, JoinOutcome, LeaveOutcome};
use crate::db_types::{DailyMatch, MatchPlayer, MatchTeam, NewMatch};

/// Match and team capacity engine contract.
///
/// Every check-then-act sequence on the capacity counters happens inside one transaction in the backend,
/// so two concurrent joins can never both pass a "not full" check and increment past capacity. Business
/// outcomes (match full, already joined, ...) are returned as values, never as errors.
#[allow(async_fn_in_trait)]
pub trait MatchManagement: Clone {
    type Error: std::error::Error;

    /// Create one match slot: conflict checks, the match row (`player_count = 0`), a confirmed field
    /// booking, two teams with palette identities drawn without replacement, and the kickoff reminder
    /// event, all in a single transaction.
    async fn create_match_slot(&self, new_match: NewMatch) -> Result<BatchSlotOutcome, Self::Error>;

    async fn fetch_match(&self, match_id: i64) -> Result<Option<DailyMatch>, Self::Error>;

    async fn fetch_teams(&self, match_id: i64) -> Result<Vec<MatchTeam>, Self::Error>;

    async fn fetch_roster(&self, match_id: i64) -> Result<Vec<MatchPlayer>, Self::Error>;

    /// Free join. Inserts the roster row and increments both counters atomically, or reports the violated
    /// precondition.
    async fn join_match(&self, match_id: i64, team_id: i64, user_id: i64) -> Result<JoinOutcome, Self::Error>;

    /// Paid join. Additionally requires a completed order whose payment id matches `payment_id`; the seat
    /// records the paid amount. Match- and team-level fullness are checked in the same critical section.
    async fn paid_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        payment_id: &str,
    ) -> Result<JoinOutcome, Self::Error>;

    /// Join funded by consuming one entry of the user's bono pack.
    async fn bono_join(
        &self,
        match_id: i64,
        team_id: i64,
        user_id: i64,
        bono_id: i64,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, Self::Error>;

    /// Delete the roster row and decrement both counters in the same atomic step. No refund is issued on
    /// voluntary leave.
    async fn leave_match(&self, match_id: i64, user_id: i64) -> Result<LeaveOutcome, Self::Error>;

    /// Device tokens registered by every roster member except `except_user`.
    async fn roster_device_tokens(&self, match_id: i64, except_user: Option<i64>) -> Result<Vec<String>, Self::Error>;
}
