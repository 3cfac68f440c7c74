// src/error.rs

//! Unified error handling for the stock watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog feed could not be fetched or decoded
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// A feed record could not be normalized
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Outbound notification failed
    #[error("Notify error ({operation}): {message}")]
    Notify { operation: String, message: String },

    /// Snapshot could not be written
    #[error("Persist error: {0}")]
    Persist(String),

    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for the given endpoint.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }

    /// Create a notification error for an outbound operation.
    pub fn notify(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notify {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error.
    pub fn persist(message: impl fmt::Display) -> Self {
        Self::Persist(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the poll loop should simply retry on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_) | Self::Notify { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = AppError::fetch("https://shop.test/api", "status 503");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://shop.test/api: status 503"
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_persist_is_not_transient() {
        assert!(!AppError::persist("disk full").is_transient());
        assert!(!AppError::invalid_record("missing code").is_transient());
    }
}
