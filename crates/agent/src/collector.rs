//! CPU temperature sources.
//!
//! [`MetricSource`] is the seam between the monitor and the hardware. Two
//! implementations ship with the agent:
//!
//! - [`VcgencmdSource`] runs the Raspberry Pi firmware tool
//!   `vcgencmd measure_temp`, which prints `temp=48.3'C`.
//! - [`ThermalZoneSource`] reads a Linux sysfs thermal zone, which holds
//!   millidegrees Celsius (`48312`).
//!
//! Any failure (spawn, timeout, non-zero exit, unparsable output) surfaces
//! as a [`MetricError`]; the monitor logs it and skips the cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use tempwatch_core::Celsius;

use crate::config::{MonitorSettings, SensorKind};

/// Upper bound for a single `vcgencmd` invocation.
const SENSOR_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// The sensor could not produce a reading this cycle.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {}s", SENSOR_TIMEOUT.as_secs())]
    Timeout { command: &'static str },

    #[error("{command} exited with status {code}: {stderr}")]
    ExitStatus {
        command: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unparsable sensor output: {0:?}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// MetricSource
// ---------------------------------------------------------------------------

/// Produces the current CPU temperature.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn read(&self) -> Result<Celsius, MetricError>;
}

/// Build the source selected in the configuration.
pub fn from_settings(settings: &MonitorSettings) -> Arc<dyn MetricSource> {
    match settings.sensor {
        SensorKind::Vcgencmd => Arc::new(VcgencmdSource),
        SensorKind::ThermalZone => {
            Arc::new(ThermalZoneSource::new(settings.thermal_zone_path.clone()))
        }
    }
}

/// Reads the SoC temperature through `vcgencmd measure_temp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VcgencmdSource;

const VCGENCMD: &str = "vcgencmd";

#[async_trait]
impl MetricSource for VcgencmdSource {
    async fn read(&self) -> Result<Celsius, MetricError> {
        let output = tokio::time::timeout(
            SENSOR_TIMEOUT,
            Command::new(VCGENCMD).arg("measure_temp").output(),
        )
        .await
        .map_err(|_| MetricError::Timeout { command: VCGENCMD })?
        .map_err(|source| MetricError::Spawn {
            command: VCGENCMD,
            source,
        })?;

        if !output.status.success() {
            return Err(MetricError::ExitStatus {
                command: VCGENCMD,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_vcgencmd(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads a sysfs thermal zone file.
#[derive(Debug, Clone)]
pub struct ThermalZoneSource {
    path: PathBuf,
}

impl ThermalZoneSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MetricSource for ThermalZoneSource {
    async fn read(&self) -> Result<Celsius, MetricError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| MetricError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_millidegrees(&raw)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse `temp=48.3'C` (optionally with a trailing newline).
pub fn parse_vcgencmd(raw: &str) -> Result<Celsius, MetricError> {
    let trimmed = raw.trim();
    let value = trimmed
        .strip_prefix("temp=")
        .and_then(|rest| rest.strip_suffix("'C"))
        .ok_or_else(|| MetricError::Parse(trimmed.to_string()))?;
    parse_finite(value, trimmed).map(Celsius)
}

/// Parse a sysfs millidegree value such as `48312`.
pub fn parse_millidegrees(raw: &str) -> Result<Celsius, MetricError> {
    let trimmed = raw.trim();
    parse_finite(trimmed, trimmed).map(|milli| Celsius(milli / 1000.0))
}

fn parse_finite(value: &str, original: &str) -> Result<f64, MetricError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MetricError::Parse(original.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
