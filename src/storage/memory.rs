//! In-memory snapshot store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Keeps the snapshot in process memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    stored: Mutex<Option<Snapshot>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Currently stored snapshot, if any was written.
    pub fn stored(&self) -> Option<Snapshot> {
        self.stored.lock().ok().and_then(|guard| guard.clone())
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Snapshot> {
        Ok(self.stored().unwrap_or_default())
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::persist("memory store is read-only"));
        }
        let mut guard = self
            .stored
            .lock()
            .map_err(|_| AppError::persist("memory store lock poisoned"))?;
        *guard = Some(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
