//! Configured temperature thresholds.
//!
//! A [`ThresholdSet`] is built once from configuration, validated, and
//! sorted descending by value so that index 0 is always the most severe
//! band. It never changes afterwards.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Celsius;

/// One entry of the `thresholds` list in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ThresholdConfig {
    /// Temperature in degrees Celsius.
    pub value: f64,
    /// Seconds the reading must stay on one side of `value` before a
    /// transition is accepted. Defaults to `0` (immediate).
    #[serde(default)]
    pub duration: i64,
}

/// A validated threshold: a value plus its confirmation (debounce) duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub value: Celsius,
    pub confirm: Duration,
}

impl Threshold {
    pub fn new(value: f64, confirm_secs: u64) -> Self {
        Self {
            value: Celsius(value),
            confirm: Duration::from_secs(confirm_secs),
        }
    }
}

/// Immutable, non-empty, strictly descending list of thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSet {
    thresholds: Vec<Threshold>,
}

impl ThresholdSet {
    /// Validate and sort a list of thresholds.
    ///
    /// Fails with [`CoreError::ConfigInvalid`] when the list is empty, a
    /// value is not finite, or two thresholds share a value.
    pub fn new(mut thresholds: Vec<Threshold>) -> Result<Self, CoreError> {
        if thresholds.is_empty() {
            return Err(CoreError::ConfigInvalid(
                "at least one threshold must be configured".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for threshold in &thresholds {
            if !threshold.value.is_finite() {
                return Err(CoreError::ConfigInvalid(format!(
                    "threshold value must be a finite number, got {}",
                    threshold.value.value()
                )));
            }
            if !seen.insert(threshold.value) {
                return Err(CoreError::ConfigInvalid(format!(
                    "duplicate threshold value {}",
                    threshold.value.value()
                )));
            }
        }

        thresholds.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(Self { thresholds })
    }

    /// Build a set from raw configuration entries, rejecting negative
    /// durations in addition to the checks done by [`ThresholdSet::new`].
    pub fn from_config(entries: &[ThresholdConfig]) -> Result<Self, CoreError> {
        let thresholds = entries
            .iter()
            .map(|entry| {
                let confirm_secs = u64::try_from(entry.duration).map_err(|_| {
                    CoreError::ConfigInvalid(format!(
                        "duration for threshold {} must be >= 0, got {}",
                        entry.value, entry.duration
                    ))
                })?;
                Ok(Threshold::new(entry.value, confirm_secs))
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Self::new(thresholds)
    }

    /// All thresholds at or below `reading`, most severe first.
    ///
    /// An empty slice means the reading is normal. Because the set is
    /// sorted descending, the exceeded thresholds are always a suffix.
    pub fn exceeded(&self, reading: Celsius) -> &[Threshold] {
        let first = self.thresholds.partition_point(|t| t.value > reading);
        &self.thresholds[first..]
    }

    /// Look up the threshold configured for `value`.
    pub fn get(&self, value: Celsius) -> Option<&Threshold> {
        self.thresholds.iter().find(|t| t.value == value)
    }

    /// The most severe (highest) threshold.
    pub fn highest(&self) -> &Threshold {
        // Non-empty by construction.
        &self.thresholds[0]
    }

    pub fn as_slice(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Threshold> {
        self.thresholds.iter()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
