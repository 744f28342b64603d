use crate::common::{jwt, TokenSet};
use crate::error::{AuthError, TokenError};
use chrono::{DateTime, Duration, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const EXPIRY_BUFFER: Duration = Duration::minutes(5);
const TOKEN_FILE: &str = "tesla_tokens.json";

/// File-backed store for the current [`TokenSet`].
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader never observes a half-written record. One writer process at a time
/// is assumed.
#[derive(Debug, Clone)]
pub struct TokenStore {
    token_path: PathBuf,
}

impl TokenStore {
    /// Store under the platform data directory.
    pub fn new() -> Result<Self, AuthError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find data directory".to_string()))?
            .join("tesla-order-status");
        Ok(Self::in_dir(data_dir))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            token_path: dir.as_ref().join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    pub fn exists(&self) -> bool {
        self.token_path.is_file()
    }

    pub fn save(&self, tokens: &TokenSet) -> Result<(), TokenError> {
        if !tokens.is_complete() {
            return Err(TokenError::Corrupt(
                "refusing to persist a token set without access and refresh token".to_string(),
            ));
        }

        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| TokenError::Corrupt(e.to_string()))?;

        let tmp_path = self.token_path.with_extension("json.tmp");
        write_owner_only(&tmp_path, json.as_bytes())?;

        fs::rename(&tmp_path, &self.token_path)?;
        tracing::debug!(path = %self.token_path.display(), "Tokens saved");
        Ok(())
    }

    pub fn load(&self) -> Result<TokenSet, TokenError> {
        if !self.token_path.exists() {
            return Err(TokenError::Missing);
        }

        let json = fs::read_to_string(&self.token_path)?;
        let tokens: TokenSet =
            serde_json::from_str(&json).map_err(|e| TokenError::Corrupt(e.to_string()))?;

        if !tokens.is_complete() {
            return Err(TokenError::Corrupt(
                "access or refresh token is empty".to_string(),
            ));
        }
        Ok(tokens)
    }

    pub fn clear(&self) -> Result<(), TokenError> {
        match fs::remove_file(&self.token_path) {
            Ok(()) => {
                tracing::debug!(path = %self.token_path.display(), "Tokens cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the access token can still be used. Prefers the `exp` claim
    /// embedded in the token and falls back to the stored `expires_at`.
    pub fn is_valid(&self, tokens: &TokenSet) -> bool {
        is_valid_at(tokens, Utc::now())
    }
}

/// Write `data` to a fresh file that is created with mode 0600 on unix, so
/// the content is never readable by other users.
fn write_owner_only(path: &Path, data: &[u8]) -> io::Result<()> {
    // `mode` only applies on creation, so a leftover file is removed first
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

pub(crate) fn is_valid_at(tokens: &TokenSet, now: DateTime<Utc>) -> bool {
    if tokens.access_token.is_empty() {
        return false;
    }

    let expires_at = jwt::expiry(&tokens.access_token).unwrap_or(tokens.expires_at);

    // Expire tokens 5 minutes early
    expires_at > now + EXPIRY_BUFFER
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn token_set(expires_at: DateTime<Utc>) -> TokenSet {
        TokenSet::new("access", "refresh", "Bearer", expires_at)
    }

    fn jwt(exp: i64) -> String {
        format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp))
        )
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let tokens = token_set(Utc::now() + Duration::hours(8));

        store.save(&tokens).unwrap();

        assert_eq!(store.load().unwrap(), tokens);
        assert!(store.exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        store.save(&token_set(Utc::now())).unwrap();

        let newer = TokenSet::new("access-2", "refresh-2", "Bearer", Utc::now());
        store.save(&newer).unwrap();

        assert_eq!(store.load().unwrap(), newer);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        store.save(&token_set(Utc::now())).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn stale_world_readable_temp_file_is_not_reused() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let tmp_path = store.path().with_extension("json.tmp");
        fs::write(&tmp_path, "left over").unwrap();
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&token_set(Utc::now())).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_is_created_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.tmp");
        write_owner_only(&path, b"token").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "token");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        assert!(matches!(store.load(), Err(TokenError::Missing)));
    }

    #[test]
    fn unparsable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        fs::write(store.path(), "{\"access_token\": ").unwrap();
        assert!(matches!(store.load(), Err(TokenError::Corrupt(_))));
    }

    #[test]
    fn empty_refresh_token_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        fs::write(
            store.path(),
            r#"{"access_token":"a","refresh_token":"","token_type":"Bearer","expires_at":1700000000}"#,
        )
        .unwrap();
        assert!(matches!(store.load(), Err(TokenError::Corrupt(_))));
    }

    #[test]
    fn refuses_to_save_incomplete_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        let tokens = TokenSet::new("access", "", "Bearer", Utc::now());

        assert!(store.save(&tokens).is_err());
        assert!(!store.exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path());
        store.save(&token_set(Utc::now())).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn validity_uses_stored_expiry_for_opaque_tokens() {
        let now = Utc::now();
        assert!(is_valid_at(&token_set(now + Duration::hours(1)), now));
        assert!(!is_valid_at(&token_set(now + Duration::minutes(4)), now));
        assert!(!is_valid_at(&token_set(now - Duration::hours(1)), now));
    }

    #[test]
    fn validity_prefers_jwt_expiry() {
        let now = Utc::now();
        let far_future = now + Duration::days(1);

        let mut tokens = token_set(far_future);
        tokens.access_token = jwt((now - Duration::minutes(1)).timestamp());
        assert!(!is_valid_at(&tokens, now));

        let mut tokens = token_set(now - Duration::days(1));
        tokens.access_token = jwt((now + Duration::hours(2)).timestamp());
        assert!(is_valid_at(&tokens, now));
    }

    #[test]
    fn empty_access_token_is_never_valid() {
        let now = Utc::now();
        let mut tokens = token_set(now + Duration::hours(1));
        tokens.access_token.clear();
        assert!(!is_valid_at(&tokens, now));
    }
}
