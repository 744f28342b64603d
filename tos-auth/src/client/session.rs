use url::{form_urlencoded, Url};

use crate::client::auth_client::OAuthClient;
use crate::client::pkce::{generate_state, PkceChallenge};
use crate::client::token_storage::TokenStore;
use crate::common::TokenSet;
use crate::error::{AuthError, TokenError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    ChallengeIssued,
    Authenticated,
    Expired,
}

/// Drives the PKCE login and the token lifecycle on top of a [`TokenStore`].
pub struct AuthSession {
    client: OAuthClient,
    store: TokenStore,
    state: SessionState,
    pending_state: Option<String>,
    tokens: Option<TokenSet>,
}

impl AuthSession {
    pub fn new(client: OAuthClient, store: TokenStore) -> Self {
        Self {
            client,
            store,
            state: SessionState::Unauthenticated,
            pending_state: None,
            tokens: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Token set held by this session, if it is still usable.
    pub fn current(&self) -> Result<&TokenSet, TokenError> {
        let tokens = self.tokens.as_ref().ok_or(TokenError::Missing)?;
        if self.state != SessionState::Authenticated || !self.store.is_valid(tokens) {
            return Err(TokenError::Expired);
        }
        Ok(tokens)
    }

    /// Starts a login attempt. The caller sends the user to the returned URL
    /// and keeps the challenge until [`AuthSession::complete_login`].
    pub fn begin_login(&mut self) -> Result<(String, PkceChallenge), AuthError> {
        let challenge = PkceChallenge::generate()?;
        let state = generate_state()?;
        let url = self.client.authorization_url(&challenge, &state)?;

        self.pending_state = Some(state);
        self.state = SessionState::ChallengeIssued;
        tracing::info!("Login started, awaiting authorization code");

        Ok((url, challenge))
    }

    /// Finishes a login with the redirect URL (or the bare code) the user
    /// came back with. On rejection the session stays in ChallengeIssued.
    pub async fn complete_login(
        &mut self,
        redirect_url_or_code: &str,
        verifier: &str,
    ) -> Result<TokenSet, AuthError> {
        let callback = parse_callback(redirect_url_or_code)?;

        if let (Some(expected), Some(received)) = (&self.pending_state, &callback.state) {
            if expected != received {
                tracing::warn!("Redirect state does not match the login attempt");
                return Err(AuthError::StateMismatch);
            }
        }

        let tokens = self
            .client
            .exchange_code(&callback.code, verifier)
            .await
            .map_err(AuthError::from_exchange)?;

        self.store.save(&tokens)?;
        self.pending_state = None;
        self.state = SessionState::Authenticated;
        self.tokens = Some(tokens.clone());
        tracing::info!("Login completed");

        Ok(tokens)
    }

    /// Replaces the token set using `refresh_token`. Any failure clears the
    /// store so a dead credential is not retried on the next run.
    pub async fn refresh(&mut self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        match self.client.refresh_token(refresh_token).await {
            Ok(tokens) => {
                self.store.save(&tokens)?;
                self.state = SessionState::Authenticated;
                self.tokens = Some(tokens.clone());
                tracing::info!("Access token refreshed");
                Ok(tokens)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, signing out");
                self.reset()?;
                Err(AuthError::from_refresh(e))
            }
        }
    }

    /// Returns a usable token set, refreshing once if needed. Anything past
    /// that needs a new login.
    pub async fn ensure_valid(&mut self) -> Result<TokenSet, AuthError> {
        let tokens = match self.store.load() {
            Ok(tokens) => tokens,
            Err(TokenError::Missing) => {
                self.state = SessionState::Unauthenticated;
                return Err(AuthError::ReauthenticationRequired(TokenError::Missing));
            }
            Err(TokenError::Corrupt(reason)) => {
                tracing::warn!(%reason, "Stored tokens are corrupt, discarding");
                self.reset()?;
                return Err(AuthError::ReauthenticationRequired(TokenError::Corrupt(
                    reason,
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if self.store.is_valid(&tokens) {
            self.state = SessionState::Authenticated;
            self.tokens = Some(tokens.clone());
            return Ok(tokens);
        }

        tracing::info!("Access token expired, refreshing");
        self.state = SessionState::Expired;
        self.tokens = None;

        match self.refresh(&tokens.refresh_token).await {
            Ok(tokens) => Ok(tokens),
            Err(AuthError::Token(reason)) => Err(AuthError::ReauthenticationRequired(reason)),
            Err(e) => Err(AuthError::ReauthenticationRequired(
                TokenError::RefreshFailed(e.to_string()),
            )),
        }
    }

    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.reset()?;
        tracing::info!("Signed out");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), TokenError> {
        self.state = SessionState::Unauthenticated;
        self.pending_state = None;
        self.tokens = None;
        self.store.clear()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: Option<String>,
}

/// Accepts a full redirect URL, a bare query string, or the raw code.
fn parse_callback(input: &str) -> Result<Callback, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::MissingCode);
    }

    let pairs: Vec<(String, String)> = if let Ok(url) = Url::parse(input) {
        url.query_pairs().into_owned().collect()
    } else if input.contains('=') {
        let query = input.rsplit_once('?').map_or(input, |(_, q)| q);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    } else {
        return Ok(Callback {
            code: input.to_string(),
            state: None,
        });
    };

    let find = |key: &str| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
    };

    Ok(Callback {
        code: find("code").ok_or(AuthError::MissingCode)?,
        state: find("state"),
    })
}
