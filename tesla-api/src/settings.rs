use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub owner_api_url: String,
    pub tasks_api_url: String,
    /// Sent as `appVersion`; the gateway does not check it strictly
    pub app_version: String,
    pub device_language: String,
    pub device_country: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            owner_api_url: "https://owner-api.teslamotors.com".to_string(),
            tasks_api_url: "https://akamai-apigateway-vfx.tesla.com".to_string(),
            app_version: "9.99.9-9999".to_string(),
            device_language: "en".to_string(),
            device_country: "DE".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiSettings {
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("api.owner_api_url", &self.owner_api_url),
            ("api.tasks_api_url", &self.tasks_api_url),
        ] {
            if !url.starts_with("http") {
                return Err(format!("{} must be a valid HTTP(S) URL", name));
            }
        }
        if self.timeout_secs == 0 {
            return Err("api.timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}
