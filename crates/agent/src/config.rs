//! Agent configuration.
//!
//! Loaded once at startup from a YAML file, then patched with environment
//! overrides. Nothing re-reads the configuration while the agent runs.
//!
//! | Variable                   | Default       | Description                          |
//! |----------------------------|---------------|--------------------------------------|
//! | `TEMPWATCH_CONFIG`         | `config.yml`  | Path of the YAML configuration file  |
//! | `TELEGRAM_TOKEN`           | --            | Overrides `telegram.token`           |
//! | `TELEGRAM_CHAT_ID`         | --            | Overrides `telegram.chat_id`         |
//! | `MONITOR_INTERVAL_SECS`    | `60`          | Overrides `monitor.interval_secs`    |
//! | `MONITOR_FIRST_DELAY_SECS` | `30`          | Overrides `monitor.first_delay_secs` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use tempwatch_core::{CoreError, ThresholdConfig, ThresholdSet};
use tempwatch_telegram::ChatId;

const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Default seconds between temperature checks.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default delay before the first temperature check.
const DEFAULT_FIRST_DELAY_SECS: u64 = 30;

const DEFAULT_THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Telegram bot token is not configured (set telegram.token or TELEGRAM_TOKEN)")]
    MissingToken,

    #[error("Telegram chat id is not configured (set telegram.chat_id or TELEGRAM_CHAT_ID)")]
    MissingChatId,

    #[error("{name} must be a valid integer, got {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("monitor.interval_secs must be greater than zero")]
    ZeroInterval,

    #[error(transparent)]
    Core(#[from] CoreError),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Which sensor backs the temperature readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Raspberry Pi firmware tool (`vcgencmd measure_temp`).
    #[default]
    Vcgencmd,
    /// Linux sysfs thermal zone (millidegrees Celsius).
    ThermalZone,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramSettings {
    #[serde(default)]
    pub token: String,
    /// Chat that receives alerts. Also the only user allowed to run commands.
    #[serde(default)]
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub interval_secs: u64,
    pub first_delay_secs: u64,
    pub sensor: SensorKind,
    pub thermal_zone_path: PathBuf,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            first_delay_secs: DEFAULT_FIRST_DELAY_SECS,
            sensor: SensorKind::default(),
            thermal_zone_path: PathBuf::from(DEFAULT_THERMAL_ZONE_PATH),
        }
    }
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn first_delay(&self) -> Duration {
        Duration::from_secs(self.first_delay_secs)
    }
}

/// Full agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub telegram: TelegramSettings,
    pub thresholds: Vec<ThresholdConfig>,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

impl AgentConfig {
    /// Load, override from the process environment, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TEMPWATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            thresholds = config.thresholds.len(),
            interval_secs = config.monitor.interval_secs,
            sensor = ?config.monitor.sensor,
            "Loaded agent configuration"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.token = token;
        }
        if let Some(chat_id) = parse_env(&lookup, "TELEGRAM_CHAT_ID")? {
            self.telegram.chat_id = chat_id;
        }
        if let Some(secs) = parse_env(&lookup, "MONITOR_INTERVAL_SECS")? {
            self.monitor.interval_secs = secs;
        }
        if let Some(secs) = parse_env(&lookup, "MONITOR_FIRST_DELAY_SECS")? {
            self.monitor.first_delay_secs = secs;
        }
        Ok(())
    }

    /// Reject configurations the agent cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.telegram.chat_id == 0 {
            return Err(ConfigError::MissingChatId);
        }
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        self.threshold_set()?;
        Ok(())
    }

    /// Validated, descending threshold set.
    pub fn threshold_set(&self) -> Result<ThresholdSet, CoreError> {
        ThresholdSet::from_config(&self.thresholds)
    }
}

fn parse_env<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
