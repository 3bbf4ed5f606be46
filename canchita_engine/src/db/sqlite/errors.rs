use cnc_common::Money;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Match not found: {0}")]
    MatchNotFound(i64),
    #[error("Team not found: {0}")]
    TeamNotFound(i64),
    #[error("Bono not found: {0}")]
    BonoNotFound(i64),
    #[error("Wallet has insufficient funds for user {user_id}: requested {requested}, available {available}")]
    InsufficientFunds { user_id: i64, requested: Money, available: Money },
}
