// src/pipeline/normalize.rs

//! Product normalization.
//!
//! Maps raw feed records onto [`ProductRecord`]. Pure: no I/O, no clock.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{FeedConfig, ProductId, ProductRecord, RawProduct, VariantSet};
use crate::utils::join_link;

/// Display text used when the feed carries no usable price.
pub const PRICE_NOT_AVAILABLE: &str = "Price not available";

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price pattern"));

/// Outcome of normalizing one feed page.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ProductRecord>,
    /// Records dropped as invalid
    pub skipped: usize,
}

/// Converts raw feed records into canonical products.
#[derive(Debug, Clone)]
pub struct Normalizer {
    site_origin: String,
    currency_symbol: String,
}

impl Normalizer {
    pub fn new(site_origin: impl Into<String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            site_origin: site_origin.into(),
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn from_config(feed: &FeedConfig) -> Self {
        Self::new(&feed.site_origin, &feed.currency_symbol)
    }

    /// Normalize every record, skipping the invalid ones.
    pub fn normalize_batch(&self, raw_products: &[Value]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        for (position, raw) in raw_products.iter().enumerate() {
            match self.normalize(raw) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    batch.skipped += 1;
                    log::warn!("Skipping feed record #{}: {}", position, e);
                }
            }
        }
        batch
    }

    /// Normalize a single raw record.
    pub fn normalize(&self, raw: &Value) -> Result<ProductRecord> {
        let product = RawProduct::deserialize(raw)
            .map_err(|e| AppError::invalid_record(format!("undecodable product: {e}")))?;

        let id = product
            .code
            .as_ref()
            .and_then(code_to_string)
            .and_then(ProductId::new)
            .ok_or_else(|| AppError::invalid_record("missing product code"))?;

        let (display_price, price_value) = self.resolve_price(&product);

        let name = product
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());

        let link = product
            .url
            .as_deref()
            .map(|path| join_link(&self.site_origin, path))
            .unwrap_or_default();

        let image = product
            .images
            .iter()
            .flatten()
            .next()
            .and_then(|img| img.url())
            .map(str::to_string);

        Ok(ProductRecord {
            id,
            name,
            display_price,
            price_value,
            link,
            image,
            variants: extract_variants(&product),
        })
    }

    /// Pick display text and numeric value.
    ///
    /// Pre-formatted strings win over numbers; the offer price wins over the
    /// regular price at each step. The numeric value comes from the same
    /// price block as the text.
    fn resolve_price(&self, product: &RawProduct) -> (String, Option<f64>) {
        let candidates = [product.offer_price.as_ref(), product.price.as_ref()];

        let formatted = candidates
            .into_iter()
            .flatten()
            .find_map(|p| p.formatted().map(|text| (text, p.value)));

        match formatted {
            Some((text, value)) => (text.to_string(), value.or_else(|| parse_price_text(text))),
            None => match candidates.into_iter().flatten().find_map(|p| p.value) {
                Some(value) => (format_amount(&self.currency_symbol, value), Some(value)),
                None => (PRICE_NOT_AVAILABLE.to_string(), None),
            },
        }
    }
}

fn code_to_string(code: &Value) -> Option<String> {
    match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Labels of variants whose stock flag is not explicitly false.
fn extract_variants(product: &RawProduct) -> VariantSet {
    product
        .variant_options
        .iter()
        .flatten()
        .filter(|v| v.is_available())
        .filter_map(|v| v.label())
        .map(str::to_string)
        .collect()
}

/// Format a numeric price with the currency symbol.
pub fn format_amount(symbol: &str, value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{symbol}{value:.0}")
    } else {
        format!("{symbol}{value:.2}")
    }
}

/// Extract the first number from a formatted price like `"₹1,299.00"`.
pub fn parse_price_text(text: &str) -> Option<f64> {
    PRICE_NUMBER
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}
