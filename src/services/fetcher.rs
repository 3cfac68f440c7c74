// src/services/fetcher.rs

//! Catalog feed fetcher.
//!
//! Retrieves the raw category document. Session cookies are established by
//! visiting a warm-up page before the first request and again after any
//! failure, which is what the storefront expects from a browser.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::FeedConfig;
use crate::utils::http::create_feed_client;

/// Source of raw catalog documents.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Human-readable source, used in logs and errors.
    fn source(&self) -> &str;

    /// Fetch the current feed document.
    async fn fetch(&self) -> Result<Value>;
}

/// Fetches the feed over HTTP with a cookie-backed session.
pub struct HttpCatalogFetcher {
    client: Client,
    url: String,
    warmup_url: Option<String>,
    warmed_up: AtomicBool,
}

impl HttpCatalogFetcher {
    pub fn new(client: Client, url: impl Into<String>, warmup_url: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            warmup_url,
            warmed_up: AtomicBool::new(false),
        }
    }

    /// Build a fetcher from feed configuration.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        let client = create_feed_client(config)?;
        Ok(Self::new(client, &config.url, config.warmup_url.clone()))
    }

    /// Visit the warm-up page once per session.
    async fn warm_up(&self) {
        let Some(warmup_url) = &self.warmup_url else {
            return;
        };
        if self.warmed_up.load(Ordering::Acquire) {
            return;
        }

        match self.client.get(warmup_url).send().await {
            Ok(response) if response.status().is_success() => {
                log::debug!("Session warm-up OK ({})", response.status());
                self.warmed_up.store(true, Ordering::Release);
            }
            Ok(response) => {
                log::warn!("Session warm-up returned {}", response.status());
            }
            Err(e) => log::warn!("Session warm-up failed: {}", e),
        }
    }

    async fn fetch_document(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&self.url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(&self.url, format!("status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&self.url, describe(&e)))?;

        serde_json::from_str(&body)
            .map_err(|e| AppError::fetch(&self.url, format!("non-JSON response: {e}")))
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    fn source(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Value> {
        self.warm_up().await;

        let result = self.fetch_document().await;
        if result.is_err() {
            // Start a fresh session next cycle.
            self.warmed_up.store(false, Ordering::Release);
        }
        result
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    }
}
