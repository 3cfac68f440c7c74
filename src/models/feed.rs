//! Raw catalog feed records.
//!
//! Field names follow the category API's JSON. Every field is optional so
//! that a single odd record fails on its own instead of failing the page.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One product object as returned by the feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    /// Item code (string or number)
    #[serde(default)]
    pub code: Option<Value>,

    #[serde(default)]
    pub name: Option<String>,

    /// Regular (list) price
    #[serde(default)]
    pub price: Option<RawPrice>,

    /// Discounted price
    #[serde(default, alias = "offer_price")]
    pub offer_price: Option<RawPrice>,

    #[serde(default)]
    pub images: Option<Vec<RawImage>>,

    /// Relative product path
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, alias = "skus")]
    pub variant_options: Option<Vec<RawVariant>>,
}

/// Price block with a numeric value and optional pre-formatted text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrice {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,

    #[serde(default)]
    pub formatted_value: Option<String>,

    #[serde(default, rename = "displayformattedValue")]
    pub display_formatted_value: Option<String>,
}

impl RawPrice {
    /// First non-blank pre-formatted string.
    pub fn formatted(&self) -> Option<&str> {
        [&self.formatted_value, &self.display_formatted_value]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Image entry, either a bare URL or an object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

impl RawImage {
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            RawImage::Url(url) => Some(url.as_str()),
            RawImage::Object { url } => url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

/// Variant (SKU) entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sc_display_size: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Explicit stock flag; absent means available
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl RawVariant {
    /// First non-blank label field.
    pub fn label(&self) -> Option<&str> {
        [&self.sc_display_size, &self.size, &self.value, &self.name]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Unknown stock is treated as available.
    pub fn is_available(&self) -> bool {
        self.in_stock != Some(false)
    }
}

/// Locate the product list inside a feed document by dotted path.
pub fn product_list<'a>(document: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |node, segment| node.get(segment))
        .and_then(Value::as_array)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
