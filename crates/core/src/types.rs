use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A temperature in degrees Celsius.
///
/// Ordered with [`f64::total_cmp`] so it can key the engine's timer maps.
/// Threshold values are checked to be finite when a
/// [`ThresholdSet`](crate::thresholds::ThresholdSet) is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Celsius(pub f64);

impl Celsius {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for Celsius {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for Celsius {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Celsius {}

impl PartialOrd for Celsius {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Celsius {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Renders with one decimal place, matching `vcgencmd` precision. Thermal
/// zone readings (millidegree resolution) are rounded the same way in every
/// message.
impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_one_decimal() {
        assert_eq!(Celsius(95.0).to_string(), "95.0");
        assert_eq!(Celsius(48.312).to_string(), "48.3");
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(Celsius(90.0) > Celsius(80.5));
        assert_eq!(Celsius(70.0), Celsius(70.0));
    }
}
