//! `tempwatch-core` -- pure temperature alerting logic.
//!
//! Contains the threshold set, the rank-based severity classifier and the
//! hysteresis engine that decides when to raise, reclassify or clear an
//! alert. Nothing in this crate performs I/O or reads the clock, so every
//! module can be tested in isolation.

pub mod alert;
pub mod error;
pub mod hysteresis;
pub mod severity;
pub mod thresholds;
pub mod types;

pub use alert::{AlertKind, TemperatureAlert};
pub use error::CoreError;
pub use hysteresis::{EngineState, HysteresisEngine, Phase};
pub use severity::{classify, Severity};
pub use thresholds::{Threshold, ThresholdConfig, ThresholdSet};
pub use types::{Celsius, Timestamp};
