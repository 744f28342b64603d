use crate::endpoints::ReferenceNumber;
use std::time::Duration;
use thiserror::Error;
use tower_api_client::{Error as TransportError, StatusCode};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The tasks gateway answered without a `tasks` object. It does this
    /// intermittently; the request can be retried.
    #[error("Received empty response from the order API")]
    EmptyResponse,

    #[error("HTTP {status}: {detail}")]
    Http { status: StatusCode, detail: String },

    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Order {0} was listed more than once")]
    DuplicateReference(ReferenceNumber),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A successful response whose body was not valid JSON for the expected
    /// type, e.g. an empty body or a bare `null`.
    pub fn is_undecodable_body(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::SerdeJson(_)))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::EmptyResponse | ApiError::Transport(_) | ApiError::Timeout(_) => true,
            ApiError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::DuplicateReference(_) => false,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::ClientError(status, detail)
            | TransportError::ServerError(status, detail) => ApiError::Http { status, detail },
            e => ApiError::Transport(e),
        }
    }
}
