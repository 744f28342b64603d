use serde::Deserialize;
use std::path::{Path, PathBuf};
use tesla_api::ApiSettings;
use tos_auth::OAuthSettings;

const CONFIG_ENV: &str = "TOS_CONFIG";
const DEFAULT_CONFIG: &str = "config.toml";
const APP_DIR: &str = "tesla-order-status";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub auth: OAuthSettings,
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub refresh: RefreshSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    /// Where tokens, snapshots, history and logs live
    pub data_dir: Option<PathBuf>,
    /// Extra `*.json` option code tables
    pub option_codes_dir: Option<PathBuf>,
    pub auto_save_orders: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            option_codes_dir: None,
            auto_save_orders: true,
        }
    }
}

impl StorageSettings {
    pub fn data_dir(&self) -> Result<PathBuf, String> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| "Could not determine a data directory".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    /// Fetched data younger than this is reused instead of refetched
    pub freshness_minutes: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            freshness_minutes: 5,
        }
    }
}

impl Settings {
    /// Load `$TOS_CONFIG` (or `config.toml` when present), then override with
    /// `TOS_<SECTION>__<KEY>` environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                builder = builder.add_source(config::File::from(Path::new(&path)));
            }
            Err(_) if Path::new(DEFAULT_CONFIG).exists() => {
                builder = builder.add_source(config::File::with_name("config"));
            }
            Err(_) => {}
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TOS")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.auth.validate()?;
        self.api.validate()?;
        Ok(())
    }
}
