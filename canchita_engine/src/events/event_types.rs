use cnc_common::Money;

use crate::db_types::DailyMatch;

/// A player took a seat in a match. Carries the tokens of the devices that should hear about it
/// (the rest of the roster, not the joiner).
#[derive(Debug, Clone)]
pub struct PlayerJoinedEvent {
    pub game: DailyMatch,
    pub player_id: i64,
    pub recipient_tokens: Vec<String>,
}

/// One refund issued during a cancellation.
#[derive(Debug, Clone)]
pub struct Refund {
    pub user_id: i64,
    pub amount: Money,
}

/// An under-filled match was cancelled by the lifecycle sweep and its players refunded.
#[derive(Debug, Clone)]
pub struct MatchCancelledEvent {
    pub game: DailyMatch,
    pub refunds: Vec<Refund>,
    pub recipient_tokens: Vec<String>,
}

/// A kickoff reminder fell due for a match.
#[derive(Debug, Clone)]
pub struct MatchReminderEvent {
    pub game: DailyMatch,
    pub recipient_tokens: Vec<String>,
}

/// A player crossed the MVP vote threshold for a match. Sent at most once per (match, player).
#[derive(Debug, Clone)]
pub struct MvpAwardedEvent {
    pub match_id: i64,
    pub user_id: i64,
    pub votes: i64,
    pub recipient_tokens: Vec<String>,
}
