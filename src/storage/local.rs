//! Local filesystem snapshot store.
//!
//! Writes go to a sibling temp file which is synced and then renamed over
//! the snapshot, so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Snapshot stored as a JSON file.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    path: PathBuf,
}

impl LocalSnapshotStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Sibling temp file: the full file name plus `.tmp`, never the target itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load(&self) -> Result<Snapshot> {
        match self.read_bytes().await? {
            Some(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                log::info!(
                    "Loaded snapshot with {} products from {}",
                    snapshot.len(),
                    self.path.display()
                );
                Ok(snapshot)
            }
            None => {
                log::warn!(
                    "No snapshot found at {}, starting empty",
                    self.path.display()
                );
                Ok(Snapshot::new())
            }
        }
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(AppError::persist)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persist(format!("{}: {}", self.path.display(), e)))?;
        log::debug!(
            "Snapshot with {} products written to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductId, VariantSet};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let variants: VariantSet = ["M", "L"].iter().map(|s| s.to_string()).collect();
        [(ProductId::new("443019876").unwrap(), variants)]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalSnapshotStore::new(tmp.path().join("snapshot.json"));

        let snapshot = store.load().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = LocalSnapshotStore::new(tmp.path().join("nested/dir/snapshot.json"));

        let snapshot = sample_snapshot();
        store.persist(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!tmp.path().join("nested/dir/snapshot.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_replaces_previous() {
        let tmp = TempDir::new().unwrap();
        let store = LocalSnapshotStore::new(tmp.path().join("snapshot.json"));

        store.persist(&sample_snapshot()).await.unwrap();
        store.persist(&Snapshot::new()).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapshot.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = LocalSnapshotStore::new(&path);
        assert!(matches!(store.load().await, Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_previous_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapshot.json");
        let store = LocalSnapshotStore::new(&path);
        store.persist(&sample_snapshot()).await.unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(tmp.path().join("snapshot.json.tmp")).unwrap();
        let result = store.persist(&Snapshot::new()).await;
        assert!(matches!(result, Err(AppError::Persist(_))));

        assert_eq!(store.load().await.unwrap(), sample_snapshot());
    }

    #[tokio::test]
    async fn test_tmp_named_snapshot_still_uses_separate_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.tmp");
        let store = LocalSnapshotStore::new(&path);
        assert_eq!(store.temp_path(), tmp.path().join("state.tmp.tmp"));

        store.persist(&sample_snapshot()).await.unwrap();
        store.persist(&sample_snapshot()).await.unwrap();

        // A directory on the temp path fails the write before the target is touched.
        std::fs::create_dir(tmp.path().join("state.tmp.tmp")).unwrap();
        assert!(store.persist(&Snapshot::new()).await.is_err());
        assert_eq!(store.load().await.unwrap(), sample_snapshot());
    }
}
