// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::{FeedConfig, NotifierConfig};

/// Create the feed client: browser-like headers, cookie store, fixed deadline.
pub fn create_feed_client(config: &FeedConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(feed_headers(config)?)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client used for outbound notifications.
pub fn create_notify_client(config: &NotifierConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn feed_headers(config: &FeedConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Ok(referer) = HeaderValue::from_str(&format!(
        "{}/",
        config.site_origin.trim_end_matches('/')
    )) {
        headers.insert(REFERER, referer);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_headers_include_referer_and_extras() {
        let config = FeedConfig::default();
        let headers = feed_headers(&config).unwrap();
        assert_eq!(headers[REFERER], "https://www.sheinindia.in/");
        assert!(headers.contains_key("accept-language"));
    }

    #[test]
    fn test_feed_headers_reject_invalid_name() {
        let mut config = FeedConfig::default();
        config.headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(feed_headers(&config), Err(AppError::Config(_))));
    }
}
