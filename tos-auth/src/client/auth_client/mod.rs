mod models;

use crate::client::config::OAuthSettings;
use crate::client::pkce::PkceChallenge;
use crate::common::TokenSet;
use crate::error::AuthError;
pub use models::AuthClientError;
use models::*;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Talks to the authorization server: builds authorization URLs and calls
/// the token endpoint for code exchange and refresh.
pub struct OAuthClient {
    http_client: Client,
    settings: OAuthSettings,
}

impl OAuthClient {
    pub fn new(settings: OAuthSettings) -> Result<Self, AuthError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    pub fn authorization_url(
        &self,
        challenge: &PkceChallenge,
        state: &str,
    ) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.settings.auth_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.settings.scope.as_str()),
                ("state", state),
                ("code_challenge", challenge.challenge.as_str()),
                ("code_challenge_method", PkceChallenge::METHOD),
            ],
        )
        .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange authorization code for access and refresh tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<TokenSet, AuthClientError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.settings.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];

        let issued_at = Utc::now();
        let tokens = self
            .post_token(&form)
            .await?
            .into_token_set(issued_at, None)?;

        tracing::debug!(expires_at = %tokens.expires_at, "Exchanged code for tokens");
        Ok(tokens)
    }

    /// Trade a refresh token for a new token set
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, AuthClientError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        let issued_at = Utc::now();
        let tokens = self
            .post_token(&form)
            .await?
            .into_token_set(issued_at, Some(refresh_token))?;

        tracing::debug!(expires_at = %tokens.expires_at, "Refreshed tokens");
        Ok(tokens)
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthClientError> {
        let resp = self
            .http_client
            .post(&self.settings.token_url)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<TokenResponse>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        if status.is_client_error() {
            let detail: OAuthErrorResponse = serde_json::from_str(&body).unwrap_or_else(|_| {
                OAuthErrorResponse {
                    error: status
                        .canonical_reason()
                        .unwrap_or("rejected")
                        .to_string(),
                    error_description: (!body.is_empty()).then(|| body.clone()),
                }
            });
            tracing::warn!(status = status.as_u16(), error = %detail.error, "Token endpoint rejected request");
            return Err(AuthClientError::Rejected {
                status: status.as_u16(),
                error: detail.error,
                description: detail.error_description,
            });
        }

        Err(AuthClientError::Server {
            status: status.as_u16(),
            body,
        })
    }
}
