//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog feed endpoint and request behavior
    #[serde(default)]
    pub feed: FeedConfig,

    /// Telegram channel settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Poll loop timing
    #[serde(default)]
    pub poll: PollConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Keep-alive endpoint
    #[serde(default)]
    pub server: ServerConfig,

    /// Price tier annotations on new products
    #[serde(default)]
    pub voucher: VoucherConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.notifier.bot_token = Some(token);
        }
        if let Some(chat) = get("CHANNEL_ID") {
            self.notifier.chat_id = Some(chat);
        }
        if let Some(url) = get("FEED_URL") {
            self.feed.url = url;
        }
        if let Some(origin) = get("SITE_ORIGIN") {
            self.feed.site_origin = origin;
        }
        if let Some(v) = get("POLL_INTERVAL_SECS") {
            self.poll.interval_secs = parse_env("POLL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("JITTER_MIN_SECS") {
            self.poll.jitter_min_secs = parse_env("JITTER_MIN_SECS", &v)?;
        }
        if let Some(v) = get("JITTER_MAX_SECS") {
            self.poll.jitter_max_secs = parse_env("JITTER_MAX_SECS", &v)?;
        }
        if let Some(v) = get("HEARTBEAT_INTERVAL_SECS") {
            self.poll.heartbeat_interval_secs = parse_env("HEARTBEAT_INTERVAL_SECS", &v)?;
        }
        if let Some(path) = get("SNAPSHOT_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(port) = get("PORT") {
            let port: u16 = parse_env("PORT", &port)?;
            self.server.bind = format!("0.0.0.0:{port}");
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(AppError::validation("feed.url is empty (set FEED_URL)"));
        }
        Url::parse(&self.feed.url)?;
        Url::parse(&self.feed.site_origin)?;
        if let Some(warmup) = &self.feed.warmup_url {
            Url::parse(warmup)?;
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.poll.interval_secs == 0 {
            return Err(AppError::validation("poll.interval_secs must be > 0"));
        }
        if self.poll.jitter_min_secs > self.poll.jitter_max_secs {
            return Err(AppError::validation(
                "poll.jitter_min_secs must not exceed poll.jitter_max_secs",
            ));
        }
        if self.notifier.max_concurrent == 0 {
            return Err(AppError::validation("notifier.max_concurrent must be > 0"));
        }
        if !self.notifier.dry_run && !self.notifier.has_credentials() {
            return Err(AppError::validation(
                "notifier credentials missing (set BOT_TOKEN and CHANNEL_ID, or use dry-run)",
            ));
        }
        if self.voucher.low_threshold > self.voucher.high_threshold {
            return Err(AppError::validation(
                "voucher.low_threshold must not exceed voucher.high_threshold",
            ));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_none() {
            return Err(AppError::validation("storage.bucket is required for s3"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{key} has an invalid value: {value:?}")))
}

/// Catalog feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Category API endpoint returning JSON
    #[serde(default)]
    pub url: String,

    /// Origin prepended to relative product paths
    #[serde(default = "defaults::site_origin")]
    pub site_origin: String,

    /// Dotted path of the product list inside the response
    #[serde(default = "defaults::products_path")]
    pub products_path: String,

    /// Request deadline in seconds
    #[serde(default = "defaults::feed_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for feed requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Page visited once to establish session cookies
    #[serde(default)]
    pub warmup_url: Option<String>,

    /// Symbol used when formatting numeric prices
    #[serde(default = "defaults::currency_symbol")]
    pub currency_symbol: String,

    /// Extra request headers
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            site_origin: defaults::site_origin(),
            products_path: defaults::products_path(),
            timeout_secs: defaults::feed_timeout(),
            user_agent: defaults::user_agent(),
            warmup_url: None,
            currency_symbol: defaults::currency_symbol(),
            headers: defaults::headers(),
        }
    }
}

/// Telegram channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot API token
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Target chat or channel id
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Message parse mode
    #[serde(default = "defaults::parse_mode")]
    pub parse_mode: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,

    /// Maximum notifications in flight within one cycle
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Log messages instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl NotifierConfig {
    /// Whether both token and chat id are configured.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.bot_token) && present(&self.chat_id)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: defaults::api_base(),
            parse_mode: defaults::parse_mode(),
            timeout_secs: defaults::notify_timeout(),
            max_concurrent: defaults::max_concurrent(),
            dry_run: false,
        }
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Lower bound of the random extra delay
    #[serde(default)]
    pub jitter_min_secs: u64,

    /// Upper bound of the random extra delay
    #[serde(default)]
    pub jitter_max_secs: u64,

    /// Seconds between liveness messages (0 disables)
    #[serde(default = "defaults::heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "defaults::heartbeat_message")]
    pub heartbeat_message: String,

    /// Send a message when the loop starts
    #[serde(default)]
    pub announce_startup: bool,

    #[serde(default = "defaults::startup_message")]
    pub startup_message: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            jitter_min_secs: 0,
            jitter_max_secs: 0,
            heartbeat_interval_secs: defaults::heartbeat_interval(),
            heartbeat_message: defaults::heartbeat_message(),
            announce_startup: false,
            startup_message: defaults::startup_message(),
        }
    }
}

/// Snapshot backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Snapshot file for the local backend
    #[serde(default = "defaults::snapshot_path")]
    pub path: PathBuf,

    /// Bucket for the s3 backend
    #[serde(default)]
    pub bucket: Option<String>,

    /// Object key for the s3 backend
    #[serde(default = "defaults::snapshot_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            path: defaults::snapshot_path(),
            bucket: None,
            key: defaults::snapshot_key(),
        }
    }
}

/// Keep-alive endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::server_enabled")]
    pub enabled: bool,

    /// Listen address (host:port)
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::server_enabled(),
            bind: defaults::bind(),
        }
    }
}

/// Price tier annotations appended to new product messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherConfig {
    #[serde(default = "defaults::voucher_enabled")]
    pub enabled: bool,

    /// Prices below this get the low tier message
    #[serde(default = "defaults::low_threshold")]
    pub low_threshold: f64,

    /// Prices at or above this get the high tier message
    #[serde(default = "defaults::high_threshold")]
    pub high_threshold: f64,

    #[serde(default = "defaults::low_message")]
    pub low_message: String,

    #[serde(default = "defaults::mid_message")]
    pub mid_message: String,

    #[serde(default = "defaults::high_message")]
    pub high_message: String,
}

impl Default for VoucherConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::voucher_enabled(),
            low_threshold: defaults::low_threshold(),
            high_threshold: defaults::high_threshold(),
            low_message: defaults::low_message(),
            mid_message: defaults::mid_message(),
            high_message: defaults::high_message(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    // Feed defaults
    pub fn site_origin() -> String {
        "https://www.sheinindia.in".into()
    }
    pub fn products_path() -> String {
        "products".into()
    }
    pub fn feed_timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn currency_symbol() -> String {
        "₹".into()
    }
    pub fn headers() -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "Accept".to_string(),
                "application/json, text/plain, */*".to_string(),
            ),
            ("Accept-Language".to_string(), "en-IN,en;q=0.9".to_string()),
        ])
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn parse_mode() -> String {
        "HTML".into()
    }
    pub fn notify_timeout() -> u64 {
        15
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Poll defaults
    pub fn interval() -> u64 {
        60
    }
    pub fn heartbeat_interval() -> u64 {
        6 * 60 * 60
    }
    pub fn heartbeat_message() -> String {
        "🟢 Stock monitor running 24/7".into()
    }
    pub fn startup_message() -> String {
        "🚀 Stock monitor started".into()
    }

    // Storage defaults
    pub fn snapshot_path() -> PathBuf {
        PathBuf::from("data/snapshot.json")
    }
    pub fn snapshot_key() -> String {
        "stockwatch/snapshot.json".into()
    }

    // Server defaults
    pub fn server_enabled() -> bool {
        true
    }
    pub fn bind() -> String {
        "0.0.0.0:8080".into()
    }

    // Voucher defaults
    pub fn voucher_enabled() -> bool {
        true
    }
    pub fn low_threshold() -> f64 {
        500.0
    }
    pub fn high_threshold() -> f64 {
        1000.0
    }
    pub fn low_message() -> String {
        "🎟 Use ₹500 Voucher".into()
    }
    pub fn mid_message() -> String {
        "🎟 Use ₹1000 Voucher".into()
    }
    pub fn high_message() -> String {
        "❌ No Voucher".into()
    }
}
