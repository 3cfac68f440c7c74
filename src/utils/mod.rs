//! Utility functions and helpers.

pub mod http;

use unicode_segmentation::UnicodeSegmentation;

/// Join the site origin with a relative product path.
///
/// Absolute URLs pass through; a blank path yields an empty link.
pub fn join_link(origin: &str, path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Truncate text to at most `max_units` UTF-16 code units.
///
/// Cuts only on grapheme boundaries and appends an ellipsis when shortened.
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    if text.encode_utf16().count() <= max_units {
        return text.to_string();
    }

    const ELLIPSIS: &str = "…";
    let budget = max_units.saturating_sub(ELLIPSIS.encode_utf16().count());

    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let units = grapheme.encode_utf16().count();
        if used + units > budget {
            break;
        }
        used += units;
        out.push_str(grapheme);
    }
    if max_units > 0 {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_link() {
        assert_eq!(
            join_link("https://shop.test/", "/p/123"),
            "https://shop.test/p/123"
        );
        assert_eq!(join_link("https://shop.test", "p/123"), "https://shop.test/p/123");
        assert_eq!(
            join_link("https://shop.test", "https://cdn.test/p/1"),
            "https://cdn.test/p/1"
        );
        assert_eq!(join_link("https://shop.test", "  "), "");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_utf16("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_respects_units_and_graphemes() {
        // Each flag is two scalars, four UTF-16 units.
        let text = "🇮🇳🇮🇳🇮🇳";
        let out = truncate_utf16(text, 9);
        assert_eq!(out, "🇮🇳🇮🇳…");
        assert!(out.encode_utf16().count() <= 9);
    }

    #[test]
    fn test_truncate_long_ascii() {
        let text = "a".repeat(5000);
        let out = truncate_utf16(&text, 4096);
        assert_eq!(out.encode_utf16().count(), 4096);
        assert!(out.ends_with('…'));
    }
}
