//! Rendering of notification events into channel messages.
//!
//! Telegram measures length limits on the parsed text, not on the HTML
//! source. Headers, prices and the product link are kept whole; only the
//! product name and size lists shrink to fit, and they are cut before
//! escaping so no entity or tag is ever split.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{NotificationEvent, ProductRecord, VoucherConfig, join_labels};
use crate::pipeline::voucher_annotation;
use crate::services::notifier::{MAX_CAPTION_UNITS, MAX_TEXT_UNITS};
use crate::utils::truncate_utf16;

/// A message ready for the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Photo { caption: String, image_url: String },
}

impl OutboundMessage {
    /// Message body, whichever form it takes.
    pub fn body(&self) -> &str {
        match self {
            OutboundMessage::Text(text) => text,
            OutboundMessage::Photo { caption, .. } => caption,
        }
    }
}

/// Render an event as HTML; products with an image become photo posts.
pub fn render_event(event: &NotificationEvent, voucher: &VoucherConfig) -> OutboundMessage {
    let product = event.product();

    let mut lines = match event {
        NotificationEvent::NewProduct { product } => {
            let mut lines = vec![
                Line::bold("🆕 ", "NEW PRODUCT"),
                Line::blank(),
                Line::field("🛍 ", &product.name),
                Line::text("💰 ", &product.display_price),
                Line::field("📏 Sizes: ", &product.variant_list()),
            ];
            if let Some(note) = voucher_annotation(product.price_value, voucher) {
                lines.push(Line::text("", note));
            }
            lines
        }
        NotificationEvent::SizeRestocked { product, sizes } => vec![
            Line::bold("🔁 ", "RESTOCK ALERT!"),
            Line::blank(),
            Line::field("🛍 ", &product.name),
            Line::text("💰 ", &product.display_price),
            Line::field("✅ Back in stock: ", &join_labels(sizes)),
        ],
        NotificationEvent::SizeSoldOut { product, sizes } => vec![
            Line::bold("❌ ", "SOLD OUT"),
            Line::blank(),
            Line::field("🛍 ", &product.name),
            Line::field("🚫 Sold out: ", &join_labels(sizes)),
            Line::field("📏 Still available: ", &product.variant_list()),
        ],
    };
    push_link(&mut lines, product);

    let limit = if product.image.is_some() {
        MAX_CAPTION_UNITS
    } else {
        MAX_TEXT_UNITS
    };
    fit_to_limit(&mut lines, limit);

    let body = lines
        .iter()
        .map(Line::to_markup)
        .collect::<Vec<_>>()
        .join("\n");

    match &product.image {
        Some(image_url) => OutboundMessage::Photo {
            caption: body,
            image_url: image_url.clone(),
        },
        None => OutboundMessage::Text(body),
    }
}

/// One message line: fixed markup plus an optional shrinkable field.
#[derive(Debug)]
struct Line {
    markup: String,
    /// Parsed length of `markup`, in UTF-16 units
    visible: usize,
    field: Option<String>,
}

impl Line {
    fn blank() -> Self {
        Self {
            markup: String::new(),
            visible: 0,
            field: None,
        }
    }

    fn bold(icon: &str, title: &str) -> Self {
        Self {
            markup: format!("{icon}<b>{}</b>", encode_text(title)),
            visible: units(icon) + units(title),
            field: None,
        }
    }

    /// Text that is never shortened.
    fn text(prefix: &str, value: &str) -> Self {
        Self {
            markup: format!("{prefix}{}", encode_text(value)),
            visible: units(prefix) + units(value),
            field: None,
        }
    }

    fn field(prefix: &str, value: &str) -> Self {
        Self {
            markup: prefix.to_string(),
            visible: units(prefix),
            field: Some(value.to_string()),
        }
    }

    fn to_markup(&self) -> String {
        match &self.field {
            Some(value) => format!("{}{}", self.markup, encode_text(value)),
            None => self.markup.clone(),
        }
    }
}

fn push_link(lines: &mut Vec<Line>, product: &ProductRecord) {
    if product.link.is_empty() {
        return;
    }
    lines.push(Line::blank());
    lines.push(Line {
        markup: format!(
            "🔗 <a href=\"{}\">Open Product</a>",
            encode_double_quoted_attribute(&product.link)
        ),
        visible: units("🔗 Open Product"),
        field: None,
    });
}

/// Shrink field values until the parsed message fits in `limit` units.
///
/// Shorter fields keep their full text; the remaining budget is split
/// evenly among the longer ones.
fn fit_to_limit(lines: &mut [Line], limit: usize) {
    let newlines = lines.len().saturating_sub(1);
    let fixed: usize = lines.iter().map(|l| l.visible).sum::<usize>() + newlines;

    let mut fields: Vec<&mut String> = lines.iter_mut().filter_map(|l| l.field.as_mut()).collect();
    let total: usize = fields.iter().map(|f| units(f)).sum();
    let mut remaining = limit.saturating_sub(fixed);
    if total <= remaining {
        return;
    }

    fields.sort_by_key(|f| units(f));
    let count = fields.len();
    for (i, field) in fields.into_iter().enumerate() {
        let share = remaining / (count - i);
        let len = units(field);
        if len > share {
            *field = truncate_utf16(field, share);
        }
        remaining -= units(field);
    }
}

fn units(text: &str) -> usize {
    text.encode_utf16().count()
}
