use chrono::{DateTime, Utc};
use cnc_common::Money;
use serde::Serialize;

use crate::db_types::{DailyMatch, MatchPlayer, MatchTeam, Order, UserBono, WalletTransaction};

/// Result of trying to create one match slot in a batch. Slot unavailability is a soft outcome that must
/// not abort the rest of the batch.
#[derive(Debug, Clone)]
pub enum BatchSlotOutcome {
    /// The slot was free; match, booking, teams and reminder were created atomically.
    Created(CreatedMatch),
    /// A confirmed field booking already overlaps this hour on this field.
    FieldBooked,
    /// A match already exists for this exact field + date + hour.
    SlotTaken,
}

#[derive(Debug, Clone)]
pub struct CreatedMatch {
    pub game: DailyMatch,
    pub teams: [MatchTeam; 2],
}

/// Outcome of a join attempt. Everything except `Joined` is an expected business outcome, not a fault.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Joined(MatchPlayer),
    MatchNotOpen,
    MatchFull,
    TeamFull,
    AlreadyJoined,
    /// The team does not belong to the target match.
    TeamMismatch,
    /// Paid join: no completed order exists for the supplied payment reference.
    PaymentNotVerified,
    /// Bono join: the pack has expired.
    BonoExpired,
    /// Bono join: the pack has no entries left.
    BonoExhausted,
}

#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    Left,
    NotJoined,
}

/// Outcome of applying a gateway payment to its order.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// First time this payment was applied; the business effect ran in this call.
    Applied(AppliedEffect),
    /// The payment had already been applied; the existing result is returned untouched.
    AlreadyApplied(AppliedEffect),
    /// The gateway has not approved the payment yet. The observed status was persisted; retry later.
    NotYetApproved(String),
    /// No order references this payment id.
    UnknownPayment,
}

/// The business effect a completed payment produced, per [`crate::db_types::PaymentPurpose`] variant.
#[derive(Debug, Clone)]
pub enum AppliedEffect {
    MatchJoined { order: Order, seat: Option<MatchPlayer> },
    BonoGranted { order: Order, bono: UserBono },
    WalletCredited { order: Order, entry: WalletTransaction },
    /// The order completed but the seat could not be taken (e.g. the match filled up or was cancelled
    /// while the payment was in flight). The money is parked on the wallet instead.
    SeatUnavailable { order: Order, refund: WalletTransaction },
}

/// Outcome of a wallet debit. Overdraw is a business outcome; the balance is untouched.
#[derive(Debug, Clone)]
pub enum DebitOutcome {
    Debited(WalletTransaction),
    InsufficientFunds { requested: Money, available: Money },
}

/// What one cancellation did: which match, who was refunded, which tokens to notify.
#[derive(Debug, Clone)]
pub struct CancellationReport {
    pub game: DailyMatch,
    pub refunds: Vec<(i64, Money)>,
    pub recipient_tokens: Vec<String>,
}

/// Outcome of a rating batch submission.
#[derive(Debug, Clone)]
pub enum RatingSubmitOutcome {
    Submitted { inserted: usize },
    AlreadyRated,
    NotParticipant,
    MatchNotFinished,
    MatchNotFound,
}

/// Per-candidate MVP vote tally for a match.
#[derive(Debug, Clone, Serialize)]
pub struct MvpTally {
    pub user_id: i64,
    pub votes: i64,
}

/// A reminder that fell due, resolved to its match and recipients.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub event_id: i64,
    pub game: DailyMatch,
    pub scheduled_at: DateTime<Utc>,
    pub recipient_tokens: Vec<String>,
}
