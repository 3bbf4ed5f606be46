use chrono::{DateTime, Utc};

use crate::db::traits::{CancellationReport, DueReminder};
use crate::db_types::DailyMatch;

/// Lifecycle sweep contract.
#[allow(async_fn_in_trait)]
pub trait LifecycleManagement: Clone {
    type Error: std::error::Error;

    /// Open matches scheduled for today whose kickoff is within the next hour and whose roster is not
    /// full. These are the cancellation candidates; full matches in the window are left untouched.
    async fn matches_pending_cancellation(&self, now: DateTime<Utc>) -> Result<Vec<DailyMatch>, Self::Error>;

    /// Cancel one under-filled match in a single transaction: set `Cancelled`, cancel the field booking,
    /// and credit each joined player the match price. Each refund is guarded by a ledger lookup so the
    /// whole operation is safe to retry if a later sweep sees the match again (at-least-once).
    ///
    /// If any refund fails the transaction rolls back and the match stays `Open` for the next sweep.
    async fn cancel_match_with_refunds(&self, match_id: i64) -> Result<CancellationReport, Self::Error>;

    /// Unsent reminder events whose `scheduled_at` has passed, resolved to their match and the current
    /// roster's device tokens.
    async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>, Self::Error>;

    /// Mark a reminder event sent. Called regardless of delivery success (at-most-once attempt).
    async fn mark_reminder_sent(&self, event_id: i64) -> Result<(), Self::Error>;
}
