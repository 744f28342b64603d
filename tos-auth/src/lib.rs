// Types shared with the rest of the workspace
pub mod common;

mod client;
mod error;

pub use client::{
    authenticate, login_interactive, AuthSession, OAuthClient, OAuthSettings, PkceChallenge,
    SessionState, TokenStore,
};
pub use common::TokenSet;
pub use error::{AuthError, TokenError};
