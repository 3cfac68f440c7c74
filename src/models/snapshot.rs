//! Persisted availability state.
//!
//! Serialized as a single JSON object:
//!
//! ```text
//! {
//!   "443019876": { "variants": ["L", "M"] },
//!   "443019877": { "variants": [] }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::product::{ProductId, VariantSet};

/// Last-known state of one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub variants: VariantSet,
}

/// Mapping from product id to its last-known variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<ProductId, SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variants recorded for a product, if it has been seen.
    pub fn variants(&self, id: &ProductId) -> Option<&VariantSet> {
        self.entries.get(id).map(|e| &e.variants)
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.entries.contains_key(id)
    }

    /// Record the current variants of a product.
    pub fn set_variants(&mut self, id: ProductId, variants: VariantSet) {
        self.entries.insert(id, SnapshotEntry { variants });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of available variants across all products.
    pub fn variant_count(&self) -> usize {
        self.entries.values().map(|e| e.variants.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, &SnapshotEntry)> {
        self.entries.iter()
    }
}

impl FromIterator<(ProductId, VariantSet)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ProductId, VariantSet)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (id, variants) in iter {
            snapshot.set_variants(id, variants);
        }
        snapshot
    }
}
