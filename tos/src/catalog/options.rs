use crate::storage::StorageError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const UNKNOWN_OPTION: &str = "Unknown option code";

const BUILTIN: &str = include_str!("../../data/option_codes.json");

/// Lookup table from configuration option codes to descriptions.
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    codes: HashMap<String, String>,
}

impl OptionCatalog {
    pub fn from_map(codes: HashMap<String, String>) -> Self {
        Self { codes }
    }

    /// The table shipped with the binary.
    pub fn builtin() -> Self {
        // The embedded table is checked by a unit test.
        let codes = serde_json::from_str(BUILTIN).unwrap_or_default();
        Self { codes }
    }

    /// The builtin table overlaid with every `*.json` file in `dir`, applied in
    /// file name order so later files win.
    pub fn load(dir: Option<&Path>) -> Result<Self, StorageError> {
        let mut catalog = Self::builtin();
        let Some(dir) = dir else {
            return Ok(catalog);
        };
        if !dir.is_dir() {
            debug!("Option code directory {} not found", dir.display());
            return Ok(catalog);
        }

        let io_err = |source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect::<Vec<_>>();
        files.sort();

        for path in files {
            let data = std::fs::read_to_string(&path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            let codes: HashMap<String, String> =
                serde_json::from_str(&data).map_err(|e| StorageError::CorruptFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            debug!("Loaded {} option codes from {}", codes.len(), path.display());
            catalog.codes.extend(codes);
        }

        info!("Option catalog holds {} codes", catalog.len());
        Ok(catalog)
    }

    pub fn describe(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    /// Split a comma separated code list and pair every code with its
    /// description, keeping the input order. Unknown codes are kept.
    pub fn decode(&self, raw: &str) -> Vec<(String, String)> {
        raw.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| {
                let description = self.describe(code).unwrap_or(UNKNOWN_OPTION);
                (code.to_string(), description.to_string())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
