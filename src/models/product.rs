//! Canonical product representation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Labels of the variants (sizes) currently purchasable.
pub type VariantSet = BTreeSet<String>;

/// Stable product key taken from the feed's item code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Build an id from a raw code; blank codes are rejected.
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            None
        } else {
            Some(Self(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,

    pub name: String,

    /// Human-formatted price text
    pub display_price: String,

    /// Numeric price, used only for voucher tiers
    pub price_value: Option<f64>,

    /// Absolute product URL (empty when the feed has no path)
    pub link: String,

    pub image: Option<String>,

    pub variants: VariantSet,
}

impl ProductRecord {
    /// Comma separated variant labels, or a dash when none are available.
    pub fn variant_list(&self) -> String {
        join_labels(&self.variants)
    }
}

/// Join labels for display.
pub fn join_labels(labels: &VariantSet) -> String {
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_rejects_blank() {
        assert!(ProductId::new("").is_none());
        assert!(ProductId::new("   ").is_none());
        assert_eq!(ProductId::new(" 443 ").unwrap().as_str(), "443");
    }

    #[test]
    fn test_join_labels() {
        let labels: VariantSet = ["L", "M"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_labels(&labels), "L, M");
        assert_eq!(join_labels(&VariantSet::new()), "-");
    }
}
