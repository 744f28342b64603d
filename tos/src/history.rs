use crate::diff::ChangeEvent;
use crate::storage::{self, StorageError};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const HISTORY_FILE: &str = "tesla_order_history.json";

/// The changes detected by one refresh, stamped with the local day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: NaiveDate,
    pub changes: Vec<ChangeEvent>,
}

impl HistoryEntry {
    pub fn new(timestamp: NaiveDate, changes: Vec<ChangeEvent>) -> Self {
        Self { timestamp, changes }
    }
}

/// Append-only list of [`HistoryEntry`] persisted as one JSON array.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(HISTORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(storage::read_json(&self.path).await?.unwrap_or_default())
    }

    /// Like [`load`](Self::load), but a damaged file reads as empty.
    pub async fn load_or_empty(&self) -> Vec<HistoryEntry> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read change history: {}", e);
                Vec::new()
            }
        }
    }

    /// Add an entry and rewrite the file. An unparsable file is moved aside
    /// first so its content is never silently lost.
    pub async fn append(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(StorageError::CorruptFile { reason, .. }) => {
                let aside = self.quarantine().await?;
                warn!(
                    "Change history was corrupt ({}), moved to {}",
                    reason,
                    aside.display()
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Appending {} change(s) for {} to history",
            entry.changes.len(),
            entry.timestamp
        );
        entries.push(entry);
        storage::write_json_atomic(&self.path, &entries).await
    }

    async fn quarantine(&self) -> Result<PathBuf, StorageError> {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".corrupt-{}", Utc::now().timestamp()));
        let aside = self.path.with_file_name(name);

        fs::rename(&self.path, &aside)
            .await
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(aside)
    }
}
