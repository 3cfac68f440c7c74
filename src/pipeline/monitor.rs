// src/pipeline/monitor.rs

//! Poll loop.
//!
//! One cycle is fetch, normalize, diff, notify, persist. Cycles never
//! overlap; the monitor owns the snapshot and is its only writer.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use html_escape::encode_text;
use futures::stream::{self, StreamExt};
use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::feed::product_list;
use crate::models::{Config, EventKind, NotificationEvent, Snapshot};
use crate::pipeline::diff::calculate_diff;
use crate::pipeline::normalize::Normalizer;
use crate::services::{
    self, CatalogFetcher, HttpCatalogFetcher, MAX_TEXT_UNITS, Notifier, render_event,
};
use crate::storage::{self, SnapshotStore};
use crate::utils::truncate_utf16;

/// Statistics of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Raw records on the feed page
    pub fetched: usize,
    pub normalized: usize,
    pub skipped: usize,
    pub new_products: usize,
    pub restocked: usize,
    pub sold_out: usize,
    pub notify_failures: usize,
    /// Whether the snapshot reached durable storage
    pub persisted: bool,
}

impl CycleReport {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            fetched: 0,
            normalized: 0,
            skipped: 0,
            new_products: 0,
            restocked: 0,
            sold_out: 0,
            notify_failures: 0,
            persisted: false,
        }
    }

    pub fn event_count(&self) -> usize {
        self.new_products + self.restocked + self.sold_out
    }

    /// One-line summary for logs.
    pub fn summary_line(&self) -> String {
        format!(
            "Cycle: {} fetched, {} valid, {} skipped | {} new, {} restocked, {} sold out | {} send failures | persisted: {} ({} ms)",
            self.fetched,
            self.normalized,
            self.skipped,
            self.new_products,
            self.restocked,
            self.sold_out,
            self.notify_failures,
            self.persisted,
            (self.finished_at - self.started_at).num_milliseconds()
        )
    }
}

/// How one isolated cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed(AppError),
    /// The cycle panicked; the snapshot is the one from before it
    Panicked,
}

/// Drives poll cycles against a feed, a channel and a snapshot store.
pub struct Monitor {
    config: Arc<Config>,
    fetcher: Box<dyn CatalogFetcher>,
    notifier: Arc<dyn Notifier>,
    store: Box<dyn SnapshotStore>,
    normalizer: Normalizer,
    snapshot: Snapshot,
    last_heartbeat: Instant,
}

impl Monitor {
    /// Load the snapshot and assemble a monitor from its parts.
    pub async fn start(
        config: Arc<Config>,
        fetcher: Box<dyn CatalogFetcher>,
        notifier: Arc<dyn Notifier>,
        store: Box<dyn SnapshotStore>,
    ) -> Result<Self> {
        let snapshot = store.load().await?;
        let normalizer = Normalizer::from_config(&config.feed);

        Ok(Self {
            config,
            fetcher,
            notifier,
            store,
            normalizer,
            snapshot,
            last_heartbeat: Instant::now(),
        })
    }

    /// Wire the HTTP fetcher, configured notifier and configured store.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let fetcher = Box::new(HttpCatalogFetcher::from_config(&config.feed)?);
        let notifier = services::build_notifier(&config.notifier)?;
        let store = storage::open_store(&config.storage).await?;
        log::info!("Snapshot store: {}", store.location());

        Self::start(config, fetcher, notifier, store).await
    }

    /// Current in-memory snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Run a single cycle.
    ///
    /// A fetch failure returns `Err` and leaves the snapshot untouched.
    /// Send and persist failures are logged and reported, not returned.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let mut report = CycleReport::started();

        let document = self.fetcher.fetch().await?;
        let path = &self.config.feed.products_path;
        let raw_products = product_list(&document, path).ok_or_else(|| {
            AppError::fetch(
                self.fetcher.source(),
                format!("response has no product list at `{path}`"),
            )
        })?;
        report.fetched = raw_products.len();

        let batch = self.normalizer.normalize_batch(raw_products);
        report.normalized = batch.records.len();
        report.skipped = batch.skipped;

        if batch.records.is_empty() {
            log::warn!("Feed returned no usable products; snapshot left unchanged");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let diff = calculate_diff(&self.snapshot, &batch.records);
        report.new_products = diff.count(EventKind::NewProduct);
        report.restocked = diff.count(EventKind::SizeRestocked);
        report.sold_out = diff.count(EventKind::SizeSoldOut);

        // Every send settles before the new snapshot is committed.
        report.notify_failures = self.dispatch(&diff.events).await;
        self.snapshot = diff.updated;

        match self.store.persist(&self.snapshot).await {
            Ok(()) => report.persisted = true,
            Err(e) => log::error!(
                "Snapshot persist to {} failed; durable state is stale: {}",
                self.store.location(),
                e
            ),
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    /// Send all events with bounded concurrency; returns the failure count.
    async fn dispatch(&self, events: &[NotificationEvent]) -> usize {
        let notifier = self.notifier.as_ref();
        let voucher = &self.config.voucher;
        let concurrency = self.config.notifier.max_concurrent.max(1);

        let results: Vec<_> = stream::iter(events)
            .map(|event| async move {
                let message = render_event(event, voucher);
                (event, notifier.deliver(&message).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut failures = 0;
        for (event, result) in results {
            match result {
                Ok(()) => log::info!("Sent {} for {}", event.kind(), event.product().id),
                Err(e) => {
                    failures += 1;
                    log::warn!(
                        "Failed to send {} for {}: {}",
                        event.kind(),
                        event.product().id,
                        e
                    );
                }
            }
        }
        failures
    }

    /// Send the liveness message when its interval has elapsed.
    pub async fn maybe_heartbeat(&mut self) {
        let interval = self.config.poll.heartbeat_interval_secs;
        if interval == 0 || self.last_heartbeat.elapsed() < Duration::from_secs(interval) {
            return;
        }
        self.last_heartbeat = Instant::now();
        self.send_status(&self.config.poll.heartbeat_message).await;
    }

    /// Send a configured plain-text status line.
    async fn send_status(&self, message: &str) {
        let text = encode_text(&truncate_utf16(message, MAX_TEXT_UNITS)).into_owned();
        if let Err(e) = self.notifier.send_text(&text).await {
            log::warn!("Failed to send status message: {}", e);
        }
    }

    /// Sleep time before the next cycle: interval plus optional jitter.
    pub fn next_delay(&self) -> Duration {
        let poll = &self.config.poll;
        let jitter = if poll.jitter_max_secs > 0 {
            rand::thread_rng().gen_range(poll.jitter_min_secs..=poll.jitter_max_secs)
        } else {
            0
        };
        Duration::from_secs(poll.interval_secs + jitter)
    }

    /// Run one cycle, containing its errors and panics.
    pub async fn run_isolated_cycle(&mut self) -> CycleOutcome {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(Ok(report)) => {
                log::info!("{}", report.summary_line());
                CycleOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                if e.is_transient() {
                    log::warn!("Cycle skipped: {}", e);
                } else {
                    log::error!("Cycle failed: {}", e);
                }
                CycleOutcome::Failed(e)
            }
            Err(_) => {
                log::error!("Cycle panicked; continuing with the last snapshot");
                CycleOutcome::Panicked
            }
        }
    }

    /// Run cycles until Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Errors and panics inside a cycle are logged; the loop always continues.
    /// Shutdown is honored mid-cycle too; the stored snapshot is only ever
    /// replaced whole.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        log::info!(
            "Watching {} every {}s ({} products known)",
            self.fetcher.source(),
            self.config.poll.interval_secs,
            self.snapshot.len()
        );

        if self.config.poll.announce_startup {
            self.send_status(&self.config.poll.startup_message).await;
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = self.run_isolated_cycle() => {}
                _ = &mut shutdown => {
                    log::info!("Shutdown requested during a cycle");
                    return Ok(());
                }
            }

            self.maybe_heartbeat().await;

            let delay = self.next_delay();
            log::debug!("Next cycle in {}s", delay.as_secs());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}
