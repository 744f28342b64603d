use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File {path} is corrupt: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    #[error("Cannot write {path}: {source}")]
    WritePermission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            StorageError::WritePermission {
                path: path.to_path_buf(),
                source,
            }
        } else {
            Self::io(path, source)
        }
    }
}

/// Presence and size of one of the persisted files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
}

impl FileStatus {
    pub async fn of(path: &Path) -> Self {
        match fs::metadata(path).await {
            Ok(meta) => Self {
                path: path.to_path_buf(),
                exists: meta.is_file(),
                size: meta.len(),
            },
            Err(_) => Self {
                path: path.to_path_buf(),
                exists: false,
                size: 0,
            },
        }
    }
}

/// Read and parse a JSON file. A missing file is `Ok(None)`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let data = match fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| StorageError::CorruptFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Write `value` as pretty JSON next to `path` and rename it into place, so
/// readers never observe a partially written file.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::write(parent, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::CorruptFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let tmp = temp_path(path);
    fs::write(&tmp, json)
        .await
        .map_err(|e| StorageError::write(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StorageError::write(path, e));
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let value: Option<Value> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        write_json_atomic(&path, &json!({"a": 1})).await.unwrap();

        let read: Option<Value> = read_json(&path).await.unwrap();
        assert_eq!(read, Some(json!({"a": 1})));
        assert!(!dir.path().join("nested").join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn garbage_is_reported_as_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_json::<Value>(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::CorruptFile { .. }));
    }

    #[tokio::test]
    async fn file_status_reports_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let status = FileStatus::of(&path).await;
        assert!(!status.exists);
        assert_eq!(status.size, 0);

        std::fs::write(&path, "12345").unwrap();
        let status = FileStatus::of(&path).await;
        assert!(status.exists);
        assert_eq!(status.size, 5);
    }
}
