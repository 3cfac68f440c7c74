//! Diff calculation for stock notifications.
//!
//! Compares freshly normalized products against the last snapshot and
//! classifies every change into a [`NotificationEvent`]:
//!
//! - unseen product id => `NewProduct` (no size events on first sight)
//! - variants gone => `SizeSoldOut`
//! - variants back => `SizeRestocked`
//!
//! Products missing from the current page stay in the snapshot untouched.

use crate::models::{EventKind, NotificationEvent, ProductRecord, Snapshot, VariantSet};

/// Events of one pass plus the snapshot that reflects the current feed.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Events in feed order
    pub events: Vec<NotificationEvent>,
    /// Previous snapshot overwritten with every current product
    pub updated: Snapshot,
}

impl DiffResult {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.events.len()
    }

    /// Number of events of one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Calculate events and the updated snapshot.
///
/// Each product is compared against the working copy, so an id repeated
/// within one batch is diffed against its own earlier occurrence.
pub fn calculate_diff(previous: &Snapshot, current: &[ProductRecord]) -> DiffResult {
    let mut updated = previous.clone();
    let mut events = Vec::new();

    for product in current {
        match updated.variants(&product.id) {
            None => events.push(NotificationEvent::NewProduct {
                product: product.clone(),
            }),
            Some(known) => {
                let sold_out: VariantSet = known.difference(&product.variants).cloned().collect();
                let restocked: VariantSet =
                    product.variants.difference(known).cloned().collect();

                if !sold_out.is_empty() {
                    events.push(NotificationEvent::SizeSoldOut {
                        product: product.clone(),
                        sizes: sold_out,
                    });
                }
                if !restocked.is_empty() {
                    events.push(NotificationEvent::SizeRestocked {
                        product: product.clone(),
                        sizes: restocked,
                    });
                }
            }
        }

        updated.set_variants(product.id.clone(), product.variants.clone());
    }

    DiffResult { events, updated }
}
