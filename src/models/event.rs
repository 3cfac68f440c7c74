//! Notification events produced by the diff engine.

use std::fmt;

use serde::Serialize;

use super::product::{ProductRecord, VariantSet};

/// A notifiable change for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// First sighting of a product
    NewProduct { product: ProductRecord },

    /// Variants that became available again
    SizeRestocked {
        product: ProductRecord,
        sizes: VariantSet,
    },

    /// Variants that stopped being available
    SizeSoldOut {
        product: ProductRecord,
        sizes: VariantSet,
    },
}

/// Discriminant of a [`NotificationEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewProduct,
    SizeRestocked,
    SizeSoldOut,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::NewProduct => "new_product",
            EventKind::SizeRestocked => "size_restocked",
            EventKind::SizeSoldOut => "size_sold_out",
        })
    }
}

impl NotificationEvent {
    pub fn product(&self) -> &ProductRecord {
        match self {
            NotificationEvent::NewProduct { product }
            | NotificationEvent::SizeRestocked { product, .. }
            | NotificationEvent::SizeSoldOut { product, .. } => product,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::NewProduct { .. } => EventKind::NewProduct,
            NotificationEvent::SizeRestocked { .. } => EventKind::SizeRestocked,
            NotificationEvent::SizeSoldOut { .. } => EventKind::SizeSoldOut,
        }
    }

    /// Affected variant labels (empty for new products).
    pub fn sizes(&self) -> Option<&VariantSet> {
        match self {
            NotificationEvent::NewProduct { .. } => None,
            NotificationEvent::SizeRestocked { sizes, .. }
            | NotificationEvent::SizeSoldOut { sizes, .. } => Some(sizes),
        }
    }
}
