//! JSON file snapshot of the whole collection.

use crate::algebras::{CollectionStore, StoreError};
use crate::constants::SNAPSHOT_FORMAT_VERSION;
use crate::model::Collection;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEnvelope {
    version: u32,
    saved_at: DateTime<Utc>,
    collection: Collection,
}

/// Stores the collection as a single JSON document.
///
/// Writes go to a sibling temp file that is then renamed over the
/// snapshot, so a crash mid-write leaves the previous snapshot intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unreadable_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".unreadable-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                log::debug!("Removed snapshot {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Collection>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let envelope: SnapshotEnvelope = serde_json::from_str(&content)?;
        if envelope.version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: envelope.version,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }

        log::debug!(
            "Loaded snapshot {} saved at {}",
            self.path.display(),
            envelope.saved_at
        );
        if envelope.collection.is_empty() {
            Ok(None)
        } else {
            Ok(Some(envelope.collection))
        }
    }

    async fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        if collection.is_empty() {
            return self.clear().await;
        }

        let envelope = SnapshotEnvelope {
            version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            collection: collection.clone(),
        };
        let json = serde_json::to_string(&envelope)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        log::debug!(
            "Saved snapshot with {} groups to {}",
            collection.group_count(),
            self.path.display()
        );
        Ok(())
    }

    async fn set_aside(&self) -> Result<(), StoreError> {
        let target = self.unreadable_path();
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => {
                log::warn!(
                    "Moved unreadable snapshot {} to {}",
                    self.path.display(),
                    target.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
