//! Temperature alert types produced by the hysteresis engine.

use serde::Serialize;

use crate::severity::Severity;
use crate::types::{Celsius, Timestamp};

/// Glyph used for the full-recovery message.
pub const RECOVERY_GLYPH: &str = "✅";

/// What kind of transition the alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A band was confirmed above the previous state.
    Rise,
    /// The reading settled into a lower band without returning to normal.
    Reclassified,
    /// The reading dropped below every band.
    Recovered,
}

/// A single state transition worth telling the user about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureAlert {
    pub kind: AlertKind,
    /// Tier of the band now active. `None` on full recovery.
    pub severity: Option<Severity>,
    /// The reading that triggered the transition.
    pub reading: Celsius,
    /// The band now active (rise, re-classification) or the band that was
    /// cleared (recovery).
    pub threshold: Celsius,
    pub timestamp: Timestamp,
}

impl TemperatureAlert {
    pub fn rise(severity: Severity, reading: Celsius, threshold: Celsius, at: Timestamp) -> Self {
        Self {
            kind: AlertKind::Rise,
            severity: Some(severity),
            reading,
            threshold,
            timestamp: at,
        }
    }

    pub fn reclassified(
        severity: Severity,
        reading: Celsius,
        threshold: Celsius,
        at: Timestamp,
    ) -> Self {
        Self {
            kind: AlertKind::Reclassified,
            severity: Some(severity),
            reading,
            threshold,
            timestamp: at,
        }
    }

    pub fn recovered(reading: Celsius, cleared: Celsius, at: Timestamp) -> Self {
        Self {
            kind: AlertKind::Recovered,
            severity: None,
            reading,
            threshold: cleared,
            timestamp: at,
        }
    }

    /// Plain-text message delivered to the chat.
    pub fn message(&self) -> String {
        match (self.kind, self.severity) {
            (AlertKind::Recovered, _) | (_, None) => {
                format!("{RECOVERY_GLYPH} Temperature back to normal: {}°C", self.reading)
            }
            (_, Some(severity)) => {
                format!("{} Temperature is {}°C", severity.glyph(), self.reading)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn rise_message_carries_glyph_and_reading() {
        let alert = TemperatureAlert::rise(Severity::High, Celsius(95.0), Celsius(90.0), Utc::now());
        assert_eq!(alert.message(), "🔴 Temperature is 95.0°C");
    }

    #[test]
    fn reclassified_message_uses_new_tier() {
        let alert =
            TemperatureAlert::reclassified(Severity::Medium, Celsius(85.2), Celsius(80.0), Utc::now());
        assert_eq!(alert.message(), "🟠 Temperature is 85.2°C");
    }

    #[test]
    fn recovery_message() {
        let alert = TemperatureAlert::recovered(Celsius(62.4), Celsius(70.0), Utc::now());
        assert_eq!(alert.message(), "✅ Temperature back to normal: 62.4°C");
    }

    #[test]
    fn serializes_kind_and_severity() {
        let alert = TemperatureAlert::rise(Severity::Low, Celsius(71.0), Celsius(70.0), Utc::now());
        let json = serde_json::to_value(&alert).expect("serializable");
        assert_eq!(json["kind"], "rise");
        assert_eq!(json["severity"], "low");
        assert_eq!(json["reading"], 71.0);
    }
}
