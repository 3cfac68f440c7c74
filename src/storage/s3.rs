//! AWS S3 snapshot store.
//!
//! The snapshot is one object; `put_object` replaces it atomically, so
//! readers see either the previous or the new snapshot.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStore;

/// Snapshot stored as a single S3 object.
pub struct S3SnapshotStore {
    client: Client,
    bucket: String,
    key: String,
}

impl S3SnapshotStore {
    /// Create a new S3 snapshot store.
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create the store with credentials from the environment.
    pub async fn from_env(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, key)
    }
}

#[async_trait]
impl SnapshotStore for S3SnapshotStore {
    async fn load(&self) -> Result<Snapshot> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                let snapshot: Snapshot = serde_json::from_slice(&bytes.into_bytes())?;
                log::info!(
                    "Loaded snapshot with {} products from {}",
                    snapshot.len(),
                    self.location()
                );
                Ok(snapshot)
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::warn!("No snapshot at {}, starting empty", self.location());
                    Ok(Snapshot::new())
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_vec(snapshot).map_err(AppError::persist)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::persist(format!("{}: {}", self.location(), e)))?;

        log::debug!(
            "Snapshot with {} products written to {}",
            snapshot.len(),
            self.location()
        );
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
