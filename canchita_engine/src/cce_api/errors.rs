use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MatchFlowApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid batch template: {0}")]
    InvalidTemplate(String),
    #[error("Match {0} does not exist")]
    MatchNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum WalletApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Amounts must be positive, got {0}")]
    NonPositiveAmount(i64),
}

#[derive(Debug, Clone, Error)]
pub enum RatingApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Rating for user {0} has a score outside 1..=5")]
    InvalidRating(i64),
    #[error("User {0} cannot rate themselves")]
    SelfRating(i64),
    #[error("The MVP vote for user {0} does not name one of the rated players")]
    InvalidMvpVote(i64),
}

#[derive(Debug, Clone, Error)]
pub enum LifecycleApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
