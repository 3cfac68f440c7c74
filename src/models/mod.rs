// src/models/mod.rs

//! Domain models for the stock watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
pub mod feed;
mod product;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, FeedConfig, NotifierConfig, PollConfig, ServerConfig, StorageBackend, StorageConfig,
    VoucherConfig,
};
pub use event::{EventKind, NotificationEvent};
pub use feed::{RawImage, RawPrice, RawProduct, RawVariant};
pub use product::{ProductId, ProductRecord, VariantSet, join_labels};
pub use snapshot::{Snapshot, SnapshotEntry};
