use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OAuthSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    pub timeout_secs: u64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: "ownerapi".to_string(),
            redirect_uri: "https://auth.tesla.com/void/callback".to_string(),
            auth_url: "https://auth.tesla.com/oauth2/v3/authorize".to_string(),
            token_url: "https://auth.tesla.com/oauth2/v3/token".to_string(),
            scope: "openid email offline_access".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OAuthSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("auth.client_id is required".to_string());
        }
        for (name, url) in [
            ("auth.redirect_uri", &self.redirect_uri),
            ("auth.auth_url", &self.auth_url),
            ("auth.token_url", &self.token_url),
        ] {
            if !url.starts_with("http") {
                return Err(format!("{} must be a valid HTTP(S) URL", name));
            }
        }
        if self.timeout_secs == 0 {
            return Err("auth.timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}
