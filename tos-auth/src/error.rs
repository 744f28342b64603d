use thiserror::Error;

use crate::client::auth_client::AuthClientError;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No stored token found")]
    Missing,

    #[error("Stored token is corrupt: {0}")]
    Corrupt(String),

    #[error("Access token has expired")]
    Expired,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Token storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authorization code was rejected: {0}")]
    InvalidCode(String),

    #[error("Authorization code has expired: {0}")]
    ExpiredCode(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("No authorization code found in the redirect URL")]
    MissingCode,

    #[error("State parameter does not match the current login attempt")]
    StateMismatch,

    #[error("Token endpoint error ({status}): {detail}")]
    Endpoint { status: u16, detail: String },

    #[error("Re-authentication required: {0}")]
    ReauthenticationRequired(#[source] TokenError),

    #[error("Secure random source unavailable: {0}")]
    Entropy(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Maps a failed authorization-code exchange onto the session taxonomy.
    pub(crate) fn from_exchange(err: AuthClientError) -> Self {
        if err.mentions_expiry() {
            return AuthError::ExpiredCode(err.to_string());
        }
        match err {
            AuthClientError::Http(e) => AuthError::NetworkFailure(e),
            AuthClientError::Server { status, body } => AuthError::Endpoint {
                status,
                detail: body,
            },
            other => AuthError::InvalidCode(other.to_string()),
        }
    }

    /// Maps a failed refresh-token exchange onto the session taxonomy.
    pub(crate) fn from_refresh(err: AuthClientError) -> Self {
        match err {
            AuthClientError::Http(e) => AuthError::NetworkFailure(e),
            AuthClientError::Server { status, body } => AuthError::Endpoint {
                status,
                detail: body,
            },
            other => AuthError::Token(TokenError::RefreshFailed(other.to_string())),
        }
    }
}
