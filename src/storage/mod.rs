//! Storage abstractions for snapshot persistence.
//!
//! The snapshot is the only durable state: one JSON object mapping product
//! ids to their last-known variants.
//!
//! ## Backends
//!
//! ```text
//! local   data/snapshot.json          (temp file + rename)
//! s3      s3://{bucket}/{key}         (single put_object, feature "s3")
//! memory  in-process, for tests and dry runs
//! ```

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Snapshot, StorageBackend, StorageConfig};

// Re-export for convenience
pub use local::LocalSnapshotStore;
pub use memory::MemorySnapshotStore;
#[cfg(feature = "s3")]
pub use s3::S3SnapshotStore;

/// Trait for snapshot storage backends.
///
/// Callers guarantee a single writer; implementations need not lock.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot; a missing backing object yields an empty one.
    async fn load(&self) -> Result<Snapshot>;

    /// Replace the stored snapshot as a whole.
    async fn persist(&self, snapshot: &Snapshot) -> Result<()>;

    /// Where the snapshot lives, for logs.
    fn location(&self) -> String;
}

/// Open the backend selected in configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Box<dyn SnapshotStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Box::new(LocalSnapshotStore::new(&config.path))),
        #[cfg(feature = "s3")]
        StorageBackend::S3 => {
            let bucket = config
                .bucket
                .clone()
                .ok_or_else(|| crate::error::AppError::config("storage.bucket is required"))?;
            Ok(Box::new(
                S3SnapshotStore::from_env(bucket, config.key.clone()).await,
            ))
        }
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(crate::error::AppError::config(
            "s3 storage requires the `s3` feature",
        )),
    }
}
