//! One temperature evaluation cycle.
//!
//! [`TemperatureMonitor`] owns the [`HysteresisEngine`] and glues it to its
//! collaborators: read the sensor, compute the exceeded bands, evaluate, and
//! deliver at most one message. Sensor failures skip the cycle before the
//! engine is touched; delivery failures are logged and never roll back the
//! transition the engine already committed.

use std::sync::Arc;

use tempwatch_core::{Celsius, EngineState, HysteresisEngine, TemperatureAlert, ThresholdSet, Timestamp};
use tempwatch_telegram::{ChatId, Notifier};

use crate::collector::MetricSource;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The sensor failed; the engine was not evaluated.
    SensorUnavailable,
    /// The engine ran and had nothing to report.
    Quiet { reading: Celsius },
    /// The engine emitted an alert. `delivered` is false when the send failed.
    Alerted {
        alert: TemperatureAlert,
        delivered: bool,
    },
}

pub struct TemperatureMonitor {
    source: Arc<dyn MetricSource>,
    notifier: Arc<dyn Notifier>,
    chat_id: ChatId,
    thresholds: Arc<ThresholdSet>,
    engine: HysteresisEngine,
}

impl TemperatureMonitor {
    pub fn new(
        source: Arc<dyn MetricSource>,
        notifier: Arc<dyn Notifier>,
        chat_id: ChatId,
        thresholds: Arc<ThresholdSet>,
    ) -> Self {
        let engine = HysteresisEngine::new(Arc::clone(&thresholds));
        Self {
            source,
            notifier,
            chat_id,
            thresholds,
            engine,
        }
    }

    pub fn engine_state(&self) -> &EngineState {
        self.engine.state()
    }

    pub fn engine(&self) -> &HysteresisEngine {
        &self.engine
    }

    /// Run one cycle at `now`.
    pub async fn run_cycle(&mut self, now: Timestamp) -> CycleOutcome {
        let reading = match self.source.read().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read CPU temperature, skipping cycle");
                return CycleOutcome::SensorUnavailable;
            }
        };

        let exceeded = self.thresholds.exceeded(reading);
        tracing::debug!(%reading, exceeded = exceeded.len(), "Evaluating temperature");

        let Some(alert) = self.engine.evaluate(now, reading, exceeded) else {
            return CycleOutcome::Quiet { reading };
        };

        let text = alert.message();
        let delivered = match self.notifier.send(self.chat_id, &text).await {
            Ok(()) => {
                tracing::info!(kind = ?alert.kind, %reading, "Temperature alert delivered");
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = ?alert.kind,
                    %reading,
                    "Failed to deliver temperature alert"
                );
                false
            }
        };

        CycleOutcome::Alerted { alert, delivered }
    }
}
