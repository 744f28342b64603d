use chrono::{Duration, Utc};
use mockito::Matcher;
use serde_json::json;
use tos_auth::{
    AuthError, AuthSession, OAuthClient, OAuthSettings, SessionState, TokenError, TokenSet,
    TokenStore,
};
use url::Url;

const TOKEN_PATH: &str = "/oauth2/v3/token";

fn session_for(token_url: String, dir: &tempfile::TempDir) -> AuthSession {
    let settings = OAuthSettings {
        token_url,
        ..OAuthSettings::default()
    };
    let client = OAuthClient::new(settings).unwrap();
    AuthSession::new(client, TokenStore::in_dir(dir.path()))
}

fn token_body(access: &str, refresh: &str) -> String {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
        "expires_in": 28800
    })
    .to_string()
}

fn stored(access: &str, refresh: &str, expires_in: Duration) -> TokenSet {
    TokenSet::new(access, refresh, "Bearer", Utc::now() + expires_in)
}

#[test]
fn begin_login_builds_pkce_authorization_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("https://auth.example/token".to_string(), &dir);

    let (auth_url, challenge) = session.begin_login().unwrap();
    let url = Url::parse(&auth_url).unwrap();
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    assert_eq!(url.path(), "/oauth2/v3/authorize");
    assert_eq!(param("client_id").as_deref(), Some("ownerapi"));
    assert_eq!(
        param("redirect_uri").as_deref(),
        Some("https://auth.tesla.com/void/callback")
    );
    assert_eq!(param("response_type").as_deref(), Some("code"));
    assert_eq!(param("scope").as_deref(), Some("openid email offline_access"));
    assert_eq!(param("code_challenge"), Some(challenge.challenge.clone()));
    assert_eq!(param("code_challenge_method").as_deref(), Some("S256"));
    assert!(param("state").is_some_and(|s| !s.is_empty()));
    assert_eq!(session.state(), SessionState::ChallengeIssued);

    let (second_url, _) = session.begin_login().unwrap();
    let second = Url::parse(&second_url).unwrap();
    let second_state = second
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned());
    assert_ne!(param("state"), second_state);
}

#[tokio::test]
async fn complete_login_exchanges_code_and_persists_tokens() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("client_id".into(), "ownerapi".into()),
            Matcher::UrlEncoded("code".into(), "NA_code".into()),
            Matcher::UrlEncoded("code_verifier".into(), "the-verifier".into()),
            Matcher::UrlEncoded(
                "redirect_uri".into(),
                "https://auth.tesla.com/void/callback".into(),
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body("access-1", "refresh-1"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);

    let tokens = session
        .complete_login(
            "https://auth.tesla.com/void/callback?code=NA_code&issuer=x",
            "the-verifier",
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.store().load().unwrap(), tokens);
    assert!(session.current().is_ok());
}

#[tokio::test]
async fn rejected_code_is_invalid_code() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(400)
        .with_body(json!({"error": "invalid_grant", "error_description": "unknown code"}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);

    let err = session.complete_login("NA_bad", "verifier").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCode(_)), "got {:?}", err);
    assert!(!session.store().exists());
}

#[tokio::test]
async fn expired_code_is_reported_as_expired() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(400)
        .with_body(
            json!({"error": "invalid_grant", "error_description": "Authorization code expired"})
                .to_string(),
        )
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);

    let err = session.complete_login("NA_old", "verifier").await.unwrap_err();
    assert!(matches!(err, AuthError::ExpiredCode(_)), "got {:?}", err);
}

#[tokio::test]
async fn redirect_without_code_never_reaches_token_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);

    let err = session
        .complete_login("https://auth.tesla.com/void/callback?error=access_denied", "v")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::MissingCode));
    mock.assert_async().await;
}

#[tokio::test]
async fn mismatched_state_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);
    let (_, challenge) = session.begin_login().unwrap();

    let err = session
        .complete_login(
            "https://auth.tesla.com/void/callback?code=NA_code&state=forged",
            &challenge.verifier,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(session.state(), SessionState::ChallengeIssued);
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_token_endpoint_is_network_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("http://127.0.0.1:1/oauth2/v3/token".to_string(), &dir);

    let err = session.complete_login("NA_code", "verifier").await.unwrap_err();
    assert!(matches!(err, AuthError::NetworkFailure(_)), "got {:?}", err);
}

#[tokio::test]
async fn refresh_rejected_with_401_signs_out() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-0".into()),
        ]))
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);
    session
        .store()
        .save(&stored("access-0", "refresh-0", Duration::hours(-1)))
        .unwrap();

    let err = session.refresh("refresh-0").await.unwrap_err();

    mock.assert_async().await;
    assert!(
        matches!(err, AuthError::Token(TokenError::RefreshFailed(_))),
        "got {:?}",
        err
    );
    assert!(!session.store().exists());
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn ensure_valid_returns_stored_token_without_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);
    let tokens = stored("access-0", "refresh-0", Duration::hours(2));
    session.store().save(&tokens).unwrap();

    assert_eq!(session.ensure_valid().await.unwrap(), tokens);
    assert_eq!(session.state(), SessionState::Authenticated);
    mock.assert_async().await;
}

#[tokio::test]
async fn ensure_valid_refreshes_expired_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_body(Matcher::UrlEncoded(
            "refresh_token".into(),
            "refresh-0".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "access-1", "expires_in": 3600}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);
    session
        .store()
        .save(&stored("access-0", "refresh-0", Duration::minutes(1)))
        .unwrap();

    let tokens = session.ensure_valid().await.unwrap();

    mock.assert_async().await;
    assert_eq!(tokens.access_token, "access-1");
    // no refresh token in the response, the old one stays in use
    assert_eq!(tokens.refresh_token, "refresh-0");
    assert_eq!(session.store().load().unwrap(), tokens);
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn ensure_valid_requires_login_when_refresh_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(401)
        .with_body(json!({"error": "invalid_grant"}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("{}{}", server.url(), TOKEN_PATH), &dir);
    session
        .store()
        .save(&stored("access-0", "refresh-0", Duration::hours(-3)))
        .unwrap();

    let err = session.ensure_valid().await.unwrap_err();

    assert!(
        matches!(
            err,
            AuthError::ReauthenticationRequired(TokenError::RefreshFailed(_))
        ),
        "got {:?}",
        err
    );
    assert!(!session.store().exists());
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn ensure_valid_without_tokens_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("http://127.0.0.1:1/token".to_string(), &dir);

    let err = session.ensure_valid().await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::ReauthenticationRequired(TokenError::Missing)
    ));
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn ensure_valid_discards_corrupt_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("http://127.0.0.1:1/token".to_string(), &dir);
    std::fs::write(session.store().path(), "not json").unwrap();

    let err = session.ensure_valid().await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::ReauthenticationRequired(TokenError::Corrupt(_))
    ));
    assert!(!session.store().exists());
}

#[tokio::test]
async fn sign_out_removes_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_for("http://127.0.0.1:1/token".to_string(), &dir);
    session
        .store()
        .save(&stored("a", "r", Duration::hours(1)))
        .unwrap();
    session.ensure_valid().await.unwrap();

    session.sign_out().unwrap();

    assert!(!session.store().exists());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(matches!(session.current(), Err(TokenError::Missing)));
}
