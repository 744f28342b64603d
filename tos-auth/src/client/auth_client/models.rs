use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::{jwt, TokenSet};

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Converts the response into a complete [`TokenSet`]. A refresh response
    /// that omits the refresh token keeps `previous_refresh`.
    pub fn into_token_set(
        self,
        issued_at: DateTime<Utc>,
        previous_refresh: Option<&str>,
    ) -> Result<TokenSet, AuthClientError> {
        if self.access_token.is_empty() {
            return Err(AuthClientError::InvalidResponse(
                "Missing access token".into(),
            ));
        }

        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| AuthClientError::InvalidResponse("Missing refresh token".into()))?;

        let expires_at = match self.expires_in {
            Some(secs) => issued_at + chrono::Duration::seconds(secs),
            None => jwt::expiry(&self.access_token).unwrap_or_else(|| {
                tracing::warn!("Token response carries no lifetime; treating it as expired");
                issued_at
            }),
        };

        Ok(TokenSet::new(
            self.access_token,
            refresh_token,
            self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at,
        ))
    }
}

/// OAuth error body (RFC 6749 section 5.2)
#[derive(Debug, Default, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Debug)]
pub enum AuthClientError {
    Http(reqwest::Error),
    Rejected {
        status: u16,
        error: String,
        description: Option<String>,
    },
    Server {
        status: u16,
        body: String,
    },
    InvalidResponse(String),
}

impl AuthClientError {
    /// Whether the endpoint said the grant expired rather than being wrong.
    pub fn mentions_expiry(&self) -> bool {
        match self {
            Self::Rejected {
                error, description, ..
            } => {
                let text = format!("{} {}", error, description.as_deref().unwrap_or_default());
                text.to_lowercase().contains("expired")
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for AuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Rejected {
                status,
                error,
                description: Some(description),
            } => write!(f, "({}) {}: {}", status, error, description),
            Self::Rejected { status, error, .. } => write!(f, "({}) {}", status, error),
            Self::Server { status, body } => write!(f, "Server error ({}): {}", status, body),
            Self::InvalidResponse(msg) => write!(f, "Invalid token response: {}", msg),
        }
    }
}

impl std::error::Error for AuthClientError {}

impl From<reqwest::Error> for AuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}
