use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use canchita_engine::{
    LifecycleApiError,
    MatchFlowApiError,
    OrderFlowApiError,
    RatingApiError,
    WalletApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The checkout gateway could not be reached. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<MatchFlowApiError> for ServerError {
    fn from(e: MatchFlowApiError) -> Self {
        match e {
            MatchFlowApiError::InvalidTemplate(s) => Self::InvalidRequestBody(s),
            MatchFlowApiError::MatchNotFound(id) => Self::NoRecordFound(format!("Match {id} does not exist.")),
            MatchFlowApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<OrderFlowApiError> for ServerError {
    fn from(e: OrderFlowApiError) -> Self {
        match e {
            OrderFlowApiError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist.")),
            OrderFlowApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<WalletApiError> for ServerError {
    fn from(e: WalletApiError) -> Self {
        match e {
            WalletApiError::NonPositiveAmount(_) => Self::InvalidRequestBody(e.to_string()),
            WalletApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<RatingApiError> for ServerError {
    fn from(e: RatingApiError) -> Self {
        match e {
            RatingApiError::InvalidRating(_) | RatingApiError::SelfRating(_) | RatingApiError::InvalidMvpVote(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            RatingApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<LifecycleApiError> for ServerError {
    fn from(e: LifecycleApiError) -> Self {
        match e {
            LifecycleApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<gateway_tools::GatewayApiError> for ServerError {
    fn from(e: gateway_tools::GatewayApiError) -> Self {
        Self::GatewayError(e.to_string())
    }
}
