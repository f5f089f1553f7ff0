//! Rank-based severity tiers.
//!
//! Severity is relative to the configured set: the highest threshold is
//! [`Severity::High`], bands down to the middle index (`len / 2`) are
//! [`Severity::Medium`], and everything below is [`Severity::Low`]. Adding
//! bands redistributes the tiers without any fixed boundaries.

use serde::Serialize;

use crate::thresholds::ThresholdSet;
use crate::types::Celsius;

/// Severity tier of an alerted band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Glyph prefixed to rise and re-classification messages.
    pub fn glyph(self) -> &'static str {
        match self {
            Severity::High => "🔴",
            Severity::Medium => "🟠",
            Severity::Low => "🟡",
        }
    }
}

/// Classify a threshold value against the set it belongs to.
pub fn classify(value: Celsius, thresholds: &ThresholdSet) -> Severity {
    let bands = thresholds.as_slice();
    let middle = bands.len() / 2;

    if value >= thresholds.highest().value {
        Severity::High
    } else if value >= bands[middle].value {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::Threshold;

    fn set(values: &[f64]) -> ThresholdSet {
        ThresholdSet::new(values.iter().map(|v| Threshold::new(*v, 0)).collect())
            .expect("valid thresholds")
    }

    #[test]
    fn three_bands_map_to_high_medium_low() {
        let thresholds = ThresholdSet::new(vec![
            Threshold::new(90.0, 0),
            Threshold::new(80.0, 300),
            Threshold::new(70.0, 600),
        ])
        .expect("valid thresholds");

        assert_eq!(classify(Celsius(90.0), &thresholds), Severity::High);
        assert_eq!(classify(Celsius(80.0), &thresholds), Severity::Medium);
        assert_eq!(classify(Celsius(70.0), &thresholds), Severity::Low);
    }

    #[test]
    fn single_band_is_always_high() {
        assert_eq!(classify(Celsius(80.0), &set(&[80.0])), Severity::High);
    }

    #[test]
    fn two_bands_have_no_low_tier() {
        let thresholds = set(&[90.0, 80.0]);
        assert_eq!(classify(Celsius(90.0), &thresholds), Severity::High);
        assert_eq!(classify(Celsius(80.0), &thresholds), Severity::Medium);
    }

    #[test]
    fn tiers_stay_monotonic_with_many_bands() {
        // middle index = 5 / 2 = 2 -> 80
        let thresholds = set(&[100.0, 90.0, 80.0, 70.0, 60.0]);
        assert_eq!(classify(Celsius(100.0), &thresholds), Severity::High);
        assert_eq!(classify(Celsius(90.0), &thresholds), Severity::Medium);
        assert_eq!(classify(Celsius(80.0), &thresholds), Severity::Medium);
        assert_eq!(classify(Celsius(70.0), &thresholds), Severity::Low);
        assert_eq!(classify(Celsius(60.0), &thresholds), Severity::Low);
    }

    #[test]
    fn glyphs() {
        assert_eq!(Severity::High.glyph(), "🔴");
        assert_eq!(Severity::Medium.glyph(), "🟠");
        assert_eq!(Severity::Low.glyph(), "🟡");
    }
}
