//! Service layer for the stock watcher.
//!
//! This module contains the network-facing collaborators:
//! - Catalog fetching (`HttpCatalogFetcher`)
//! - Message rendering (`render_event`)
//! - Channel delivery (`TelegramNotifier`, `LogNotifier`)

mod fetcher;
mod message;
mod notifier;

pub use fetcher::{CatalogFetcher, HttpCatalogFetcher};
pub use message::{OutboundMessage, render_event};
pub use notifier::{LogNotifier, MAX_CAPTION_UNITS, MAX_TEXT_UNITS, Notifier, TelegramNotifier};

use std::sync::Arc;

use crate::error::Result;
use crate::models::NotifierConfig;

/// Pick the notifier the configuration asks for.
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    if config.dry_run {
        log::info!("Dry-run: notifications will be logged, not sent");
        return Ok(Arc::new(LogNotifier));
    }
    Ok(Arc::new(TelegramNotifier::from_config(config)?))
}
