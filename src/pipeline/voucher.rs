//! Voucher tier annotation for new product messages.

use crate::models::VoucherConfig;

/// Price tier relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherTier {
    /// Below the low threshold
    Low,
    /// From the low threshold up to (excluding) the high threshold
    Mid,
    /// At or above the high threshold
    High,
}

impl VoucherTier {
    pub fn classify(price: f64, config: &VoucherConfig) -> Self {
        if price < config.low_threshold {
            VoucherTier::Low
        } else if price < config.high_threshold {
            VoucherTier::Mid
        } else {
            VoucherTier::High
        }
    }

    pub fn message<'a>(&self, config: &'a VoucherConfig) -> &'a str {
        match self {
            VoucherTier::Low => &config.low_message,
            VoucherTier::Mid => &config.mid_message,
            VoucherTier::High => &config.high_message,
        }
    }
}

/// Annotation line for a price, if vouchers are enabled and the price known.
pub fn voucher_annotation(price: Option<f64>, config: &VoucherConfig) -> Option<&str> {
    if !config.enabled {
        return None;
    }
    let tier = VoucherTier::classify(price?, config);
    Some(tier.message(config)).filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let config = VoucherConfig::default();
        assert_eq!(VoucherTier::classify(499.0, &config), VoucherTier::Low);
        assert_eq!(VoucherTier::classify(500.0, &config), VoucherTier::Mid);
        assert_eq!(VoucherTier::classify(999.0, &config), VoucherTier::Mid);
        assert_eq!(VoucherTier::classify(1000.0, &config), VoucherTier::High);
    }

    #[test]
    fn test_annotation() {
        let mut config = VoucherConfig::default();
        assert_eq!(
            voucher_annotation(Some(250.0), &config),
            Some("🎟 Use ₹500 Voucher")
        );
        assert_eq!(voucher_annotation(None, &config), None);

        config.enabled = false;
        assert_eq!(voucher_annotation(Some(250.0), &config), None);
    }

    #[test]
    fn test_high_tier_policy_is_configurable() {
        let config = VoucherConfig {
            high_message: "✅ Voucher eligible".to_string(),
            ..VoucherConfig::default()
        };
        assert_eq!(
            voucher_annotation(Some(1500.0), &config),
            Some("✅ Voucher eligible")
        );
    }
}
