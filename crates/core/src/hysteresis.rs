//! Hysteresis state machine for temperature alerts.
//!
//! Pure logic: no I/O and no clock access. The caller samples the sensor,
//! computes the exceeded bands with [`ThresholdSet::exceeded`] and passes
//! the current time in, so every transition is reproducible in tests.
//!
//! Each cycle runs four steps in order:
//!
//! 1. rise-timer bookkeeping (bands that dropped out start recovering),
//! 2. rise confirmation (the most severe band that has stayed exceeded for
//!    its confirmation duration raises an alert if it is above the active
//!    band),
//! 3. full recovery (no band exceeded while alerting),
//! 4. partial recovery (the active band has stayed below the reading for its
//!    confirmation duration while a lower band is still exceeded).
//!
//! At most one [`TemperatureAlert`] is produced per cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use crate::alert::TemperatureAlert;
use crate::severity::classify;
use crate::thresholds::{Threshold, ThresholdSet};
use crate::types::{Celsius, Timestamp};

/// Coarse view of the engine's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normal,
    Alerting(Celsius),
}

/// Mutable bookkeeping owned by [`HysteresisEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    active_threshold: Option<Celsius>,
    rise_timers: BTreeMap<Celsius, Timestamp>,
    recovery_timers: BTreeMap<Celsius, Timestamp>,
    alerted: BTreeSet<Celsius>,
}

impl EngineState {
    /// Band currently in the alerted state, `None` when normal.
    pub fn active_threshold(&self) -> Option<Celsius> {
        self.active_threshold
    }

    /// First time each band was seen exceeded, pending confirmation.
    pub fn rise_timers(&self) -> &BTreeMap<Celsius, Timestamp> {
        &self.rise_timers
    }

    /// First time each band was seen below the reading, pending recovery.
    pub fn recovery_timers(&self) -> &BTreeMap<Celsius, Timestamp> {
        &self.recovery_timers
    }

    /// Bands for which a rise alert actually fired since the last reset.
    pub fn alerted(&self) -> &BTreeSet<Celsius> {
        &self.alerted
    }

    fn reset_timers(&mut self) {
        self.rise_timers.clear();
        self.recovery_timers.clear();
    }
}

/// Decides, once per sample, whether to raise, reclassify or clear an alert.
#[derive(Debug, Clone)]
pub struct HysteresisEngine {
    thresholds: Arc<ThresholdSet>,
    state: EngineState,
}

impl HysteresisEngine {
    /// Create an engine in the [`Phase::Normal`] state.
    pub fn new(thresholds: Arc<ThresholdSet>) -> Self {
        Self {
            thresholds,
            state: EngineState::default(),
        }
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        match self.state.active_threshold {
            Some(value) => Phase::Alerting(value),
            None => Phase::Normal,
        }
    }

    /// Run one evaluation cycle.
    ///
    /// `exceeded` must be the result of `thresholds().exceeded(reading)`:
    /// every band at or below the reading, most severe first. Never fails;
    /// the returned alert (if any) is already committed to the state, so a
    /// failed delivery does not roll anything back.
    pub fn evaluate(
        &mut self,
        now: Timestamp,
        reading: Celsius,
        exceeded: &[Threshold],
    ) -> Option<TemperatureAlert> {
        self.track_rise_timers(now, exceeded);

        if let Some(alert) = self.confirm_rise(now, reading, exceeded) {
            return Some(alert);
        }

        if exceeded.is_empty() {
            return self.full_recovery(now, reading);
        }

        self.partial_recovery(now, reading, exceeded)
    }

    /// Step (a): move bands that dropped out to the recovery timers and
    /// start rise timers for newly exceeded bands.
    fn track_rise_timers(&mut self, now: Timestamp, exceeded: &[Threshold]) {
        let dropped: Vec<Celsius> = self
            .state
            .rise_timers
            .keys()
            .filter(|value| !contains(exceeded, **value))
            .copied()
            .collect();

        for value in dropped {
            self.state.rise_timers.remove(&value);
            self.state.recovery_timers.insert(value, now);
            tracing::debug!(threshold = %value, "Reading dropped below band, recovery timer started");
        }

        for threshold in exceeded {
            self.state.rise_timers.entry(threshold.value).or_insert(now);
        }

        // The alert that raised the active band cleared its rise timer, so a
        // drop right after the alert would otherwise never start recovery.
        if let Some(active) = self.state.active_threshold {
            if !contains(exceeded, active) {
                self.state.recovery_timers.entry(active).or_insert(now);
            }
        }
    }

    /// Step (b): alert on the most severe confirmed band above the active one.
    fn confirm_rise(
        &mut self,
        now: Timestamp,
        reading: Celsius,
        exceeded: &[Threshold],
    ) -> Option<TemperatureAlert> {
        let active = self.state.active_threshold;
        let candidates = exceeded
            .iter()
            .take_while(|t| active.map_or(true, |current| t.value > current));

        for threshold in candidates {
            let since = self
                .state
                .rise_timers
                .get(&threshold.value)
                .copied()
                .unwrap_or(now);
            let elapsed = elapsed_secs(now, since);

            if Duration::from_secs(elapsed) < threshold.confirm {
                tracing::warn!(
                    reading = %reading,
                    threshold = %threshold.value,
                    elapsed_secs = elapsed,
                    required_secs = threshold.confirm.as_secs(),
                    "Temperature above threshold but not yet confirmed, no message sent"
                );
                continue;
            }

            let severity = classify(threshold.value, &self.thresholds);
            self.state.active_threshold = Some(threshold.value);
            self.state.alerted.insert(threshold.value);
            // A confirmed band must not be followed by a lower band
            // confirming on stale timers.
            self.state.reset_timers();

            tracing::warn!(
                reading = %reading,
                threshold = %threshold.value,
                required_secs = threshold.confirm.as_secs(),
                ?severity,
                "Temperature threshold confirmed"
            );
            return Some(TemperatureAlert::rise(severity, reading, threshold.value, now));
        }

        None
    }

    /// Step (c): every band cleared while alerting.
    fn full_recovery(&mut self, now: Timestamp, reading: Celsius) -> Option<TemperatureAlert> {
        let cleared = self.state.active_threshold.take()?;
        self.state.alerted.clear();
        self.state.reset_timers();

        tracing::info!(reading = %reading, threshold = %cleared, "Temperature back to normal");
        Some(TemperatureAlert::recovered(reading, cleared, now))
    }

    /// Step (d): the active band is no longer exceeded but a lower one is.
    fn partial_recovery(
        &mut self,
        now: Timestamp,
        reading: Celsius,
        exceeded: &[Threshold],
    ) -> Option<TemperatureAlert> {
        // Flicker: the reading climbed back over a recovering band.
        self.state.recovery_timers.retain(|value, _| *value > reading);

        let active = self.state.active_threshold?;
        if contains(exceeded, active) {
            return None;
        }

        let mut settled = None;
        for (value, since) in self.state.recovery_timers.iter().rev() {
            let Some(threshold) = self.thresholds.get(*value) else {
                continue;
            };
            let elapsed = elapsed_secs(now, *since);

            if Duration::from_secs(elapsed) < threshold.confirm {
                tracing::debug!(
                    reading = %reading,
                    threshold = %value,
                    elapsed_secs = elapsed,
                    required_secs = threshold.confirm.as_secs(),
                    "Recovery below band not yet confirmed"
                );
                continue;
            }

            if self.state.alerted.contains(value) {
                settled = Some((*value, threshold.confirm));
                break;
            }
        }

        let (recovered_from, confirm) = settled?;
        // `exceeded` is non-empty here; its head is the band now in effect.
        let band = exceeded.first()?.value;
        let severity = classify(band, &self.thresholds);

        self.state.active_threshold = Some(band);
        self.state.alerted.clear();
        // The reported band can settle further down on its own recovery.
        self.state.alerted.insert(band);
        self.state.reset_timers();

        tracing::warn!(
            reading = %reading,
            threshold = %recovered_from,
            band = %band,
            required_secs = confirm.as_secs(),
            ?severity,
            "Temperature kept below threshold, severity reclassified"
        );
        Some(TemperatureAlert::reclassified(severity, reading, band, now))
    }
}

fn contains(exceeded: &[Threshold], value: Celsius) -> bool {
    exceeded.iter().any(|t| t.value == value)
}

/// Whole seconds between `since` and `now`, rounded up.
fn elapsed_secs(now: Timestamp, since: Timestamp) -> u64 {
    let millis = now.signed_duration_since(since).num_milliseconds().max(0);
    (millis as u64).div_ceil(1000)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::alert::AlertKind;
    use crate::severity::Severity;

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn engine(bands: &[(f64, u64)]) -> HysteresisEngine {
        let set = ThresholdSet::new(bands.iter().map(|(v, d)| Threshold::new(*v, *d)).collect())
            .expect("valid thresholds");
        HysteresisEngine::new(Arc::new(set))
    }

    fn step(engine: &mut HysteresisEngine, at: i64, reading: f64) -> Option<TemperatureAlert> {
        let thresholds = Arc::clone(&engine.thresholds);
        let reading = Celsius(reading);
        engine.evaluate(t(at), reading, thresholds.exceeded(reading))
    }

    #[test]
    fn elapsed_rounds_up_partial_seconds() {
        let since = t(0);
        let now = since + chrono::Duration::milliseconds(59_001);
        assert_eq!(elapsed_secs(now, since), 60);
        assert_eq!(elapsed_secs(since, now), 0);
    }

    #[test]
    fn starts_normal_with_empty_state() {
        let engine = engine(&[(80.0, 0)]);
        assert_eq!(engine.phase(), Phase::Normal);
        assert_eq!(engine.state(), &EngineState::default());
    }

    #[test]
    fn zero_duration_band_fires_on_first_exceeding_sample() {
        let mut engine = engine(&[(90.0, 0)]);

        assert!(step(&mut engine, 0, 75.0).is_none());

        let alert = step(&mut engine, 60, 95.0).expect("rise alert");
        assert_eq!(alert.kind, AlertKind::Rise);
        assert_eq!(alert.severity, Some(Severity::High));
        assert_eq!(alert.message(), "🔴 Temperature is 95.0°C");
        assert_eq!(engine.phase(), Phase::Alerting(Celsius(90.0)));
    }

    #[test]
    fn confirmed_rise_resets_all_timers() {
        let mut engine = engine(&[(90.0, 0), (80.0, 0)]);
        step(&mut engine, 0, 95.0).expect("rise alert");

        assert!(engine.state().rise_timers().is_empty());
        assert!(engine.state().recovery_timers().is_empty());
        assert!(engine.state().alerted().contains(&Celsius(90.0)));
    }

    #[test]
    fn only_most_severe_confirmed_band_fires() {
        let mut engine = engine(&[(90.0, 0), (80.0, 0), (70.0, 0)]);
        let alert = step(&mut engine, 0, 95.0).expect("rise alert");
        assert_eq!(alert.threshold, Celsius(90.0));
        assert!(step(&mut engine, 60, 95.0).is_none());
    }

    #[test]
    fn lower_band_confirms_first_when_higher_band_is_slower() {
        let mut engine = engine(&[(90.0, 600), (80.0, 0)]);
        let alert = step(&mut engine, 0, 95.0).expect("80 confirms immediately");
        assert_eq!(alert.threshold, Celsius(80.0));
        assert_eq!(alert.severity, Some(Severity::Medium));

        for at in [60, 120, 300] {
            assert!(step(&mut engine, at, 95.0).is_none());
        }

        // Timers restarted at t=60 after the reset at t=0.
        let escalated = step(&mut engine, 660, 95.0).expect("90 confirms");
        assert_eq!(escalated.threshold, Celsius(90.0));
        assert_eq!(escalated.severity, Some(Severity::High));
    }

    #[test]
    fn full_recovery_clears_everything() {
        let mut engine = engine(&[(80.0, 0)]);
        step(&mut engine, 0, 85.0).expect("rise alert");

        let alert = step(&mut engine, 60, 75.0).expect("recovery");
        assert_eq!(alert.kind, AlertKind::Recovered);
        assert_eq!(alert.message(), "✅ Temperature back to normal: 75.0°C");
        assert_eq!(engine.phase(), Phase::Normal);
        assert!(engine.state().alerted().is_empty());
        assert!(engine.state().rise_timers().is_empty());
        assert!(engine.state().recovery_timers().is_empty());
    }

    #[test]
    fn normal_readings_never_alert() {
        let mut engine = engine(&[(80.0, 0)]);
        for at in 0..10 {
            assert!(step(&mut engine, at * 60, 60.0).is_none());
        }
    }

    #[test]
    fn reclassifies_after_confirmed_drop_into_lower_band() {
        let mut engine = engine(&[(90.0, 60), (80.0, 120), (70.0, 600)]);

        assert!(step(&mut engine, 0, 95.0).is_none());
        let rise = step(&mut engine, 60, 95.0).expect("90 confirmed");
        assert_eq!(rise.severity, Some(Severity::High));

        assert!(step(&mut engine, 120, 85.0).is_none());
        assert_eq!(
            engine.state().recovery_timers().get(&Celsius(90.0)),
            Some(&t(120))
        );

        let reclassified = step(&mut engine, 180, 85.0).expect("downgrade confirmed");
        assert_eq!(reclassified.kind, AlertKind::Reclassified);
        assert_eq!(reclassified.severity, Some(Severity::Medium));
        assert_eq!(reclassified.message(), "🟠 Temperature is 85.0°C");
        assert_eq!(engine.phase(), Phase::Alerting(Celsius(80.0)));
        assert_eq!(
            engine.state().alerted().iter().copied().collect::<Vec<_>>(),
            vec![Celsius(80.0)]
        );

        // Stable in the new band: nothing more.
        for at in [240, 300, 600] {
            assert!(step(&mut engine, at, 85.0).is_none());
        }
    }

    #[test]
    fn rises_again_after_reclassification() {
        // Zero durations: downgrade and re-rise are both immediate.
        let mut engine = engine(&[(90.0, 0), (80.0, 0)]);
        step(&mut engine, 0, 95.0).expect("rise");
        let down = step(&mut engine, 60, 85.0).expect("reclassified");
        assert_eq!(down.kind, AlertKind::Reclassified);
        assert!(step(&mut engine, 120, 85.0).is_none());

        let again = step(&mut engine, 180, 92.0).expect("rise back into 90");
        assert_eq!(again.kind, AlertKind::Rise);
        assert_eq!(again.threshold, Celsius(90.0));
    }

    #[test]
    fn flicker_cancels_pending_recovery() {
        let mut engine = engine(&[(90.0, 120), (80.0, 0)]);
        // 80 confirms immediately, 90 after 120s.
        step(&mut engine, 0, 95.0).expect("80 rise");
        assert!(step(&mut engine, 60, 95.0).is_none());
        step(&mut engine, 180, 95.0).expect("90 rise");

        let mut alerts = Vec::new();
        for (i, reading) in [85.0, 92.0, 85.0, 92.0, 85.0, 92.0].iter().enumerate() {
            let at = 240 + (i as i64) * 30;
            alerts.extend(step(&mut engine, at, *reading));
            if *reading >= 90.0 {
                assert!(!engine.state().recovery_timers().contains_key(&Celsius(90.0)));
            }
        }

        assert!(alerts.is_empty(), "flicker must not alert: {alerts:?}");
        assert_eq!(engine.phase(), Phase::Alerting(Celsius(90.0)));
    }

    #[test]
    fn recovery_only_reclassifies_bands_that_actually_alerted() {
        let mut engine = engine(&[(90.0, 300), (80.0, 0)]);
        step(&mut engine, 0, 85.0).expect("80 rise");

        // Touch 90 briefly without confirming it, then settle in 80.
        assert!(step(&mut engine, 60, 91.0).is_none());
        for at in [120, 420, 720] {
            assert!(step(&mut engine, at, 85.0).is_none());
        }
        assert_eq!(engine.phase(), Phase::Alerting(Celsius(80.0)));
    }
}
