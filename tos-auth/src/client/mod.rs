pub mod auth_client;
mod config;
mod pkce;
mod session;
mod token_storage;

pub use auth_client::OAuthClient;
pub use config::OAuthSettings;
pub use pkce::PkceChallenge;
pub use session::{AuthSession, SessionState};
pub use token_storage::TokenStore;

use crate::common::TokenSet;
use crate::error::AuthError;

/// Returns a valid token set, falling back to an interactive login when the
/// stored credentials cannot be used or refreshed.
pub async fn authenticate(session: &mut AuthSession) -> Result<TokenSet, AuthError> {
    match session.ensure_valid().await {
        Ok(tokens) => Ok(tokens),
        Err(AuthError::ReauthenticationRequired(reason)) => {
            tracing::info!(%reason, "Interactive login required");
            login_interactive(session).await
        }
        Err(e) => Err(e),
    }
}

/// Walks the user through the browser login on the terminal.
pub async fn login_interactive(session: &mut AuthSession) -> Result<TokenSet, AuthError> {
    let (auth_url, challenge) = session.begin_login()?;

    println!("\n=== Tesla Authentication Required ===\n");
    println!("A browser window will open with the Tesla login page.");
    println!("After logging in you will likely see a 'Page Not Found' page.");
    println!("Copy the full URL of that page and paste it here.");
    println!("The authentication happens only between you and Tesla.\n");

    if let Err(e) = open::that(&auth_url) {
        eprintln!("Failed to open browser automatically: {}", e);
        eprintln!("\nPlease open this URL in your browser:");
        eprintln!("{}\n", auth_url);
    } else {
        println!("Browser opened. You can also open this URL directly:");
        println!("{}\n", auth_url);
    }

    println!("Please enter the redirected URL here:");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    let tokens = session.complete_login(&input, &challenge.verifier).await?;
    println!("✓ Authentication successful!\n");

    Ok(tokens)
}
