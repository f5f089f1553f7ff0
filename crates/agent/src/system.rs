//! Host system commands and status.
//!
//! The chat commands `/uptime`, `/reboot` and `/shutdown` run a fixed
//! command line through a [`SystemRunner`]. Only the variants of
//! [`SystemCommand`] can be executed; nothing from the chat message ever
//! reaches the process arguments.
//!
//! `/status` collects CPU, memory and disk figures through `sysinfo`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sysinfo::{Disks, System};
use tokio::process::Command;

use tempwatch_core::Celsius;

/// Timeout applied to every system command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    Uptime,
    Reboot,
    Shutdown,
}

impl SystemCommand {
    /// Human label used in logs and error messages.
    pub fn action(self) -> &'static str {
        match self {
            Self::Uptime => "Uptime",
            Self::Reboot => "Reboot",
            Self::Shutdown => "Shutdown",
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Uptime => "uptime",
            Self::Reboot | Self::Shutdown => "sudo",
        }
    }

    pub fn args(self) -> &'static [&'static str] {
        match self {
            Self::Uptime => &["-p"],
            Self::Reboot => &["reboot"],
            Self::Shutdown => &["shutdown", "-h", "now"],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SystemCommandError {
    #[error("Failed to execute {action}: {source}")]
    Spawn {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} timed out after {}s", COMMAND_TIMEOUT.as_secs())]
    Timeout { action: &'static str },

    #[error("{action} failed: {stderr}")]
    Failed {
        action: &'static str,
        code: i32,
        stderr: String,
    },
}

/// Executes [`SystemCommand`]s and returns their standard output.
#[async_trait]
pub trait SystemRunner: Send + Sync {
    async fn run(&self, command: SystemCommand) -> Result<String, SystemCommandError>;
}

/// Runs commands on the host with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl SystemRunner for ShellRunner {
    async fn run(&self, command: SystemCommand) -> Result<String, SystemCommandError> {
        let action = command.action();
        tracing::info!(action, "Initiating system command");
        let start = Instant::now();

        let result = tokio::time::timeout(
            COMMAND_TIMEOUT,
            Command::new(command.program()).args(command.args()).output(),
        )
        .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                tracing::info!(action, elapsed_ms, "System command succeeded");
                Ok(stdout)
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let code = output.status.code().unwrap_or(-1);
                tracing::error!(action, elapsed_ms, code, stderr = %stderr, "System command failed");
                Err(SystemCommandError::Failed {
                    action,
                    code,
                    stderr,
                })
            }
            Ok(Err(source)) => {
                tracing::error!(action, error = %source, "System command execution error");
                Err(SystemCommandError::Spawn { action, source })
            }
            Err(_) => {
                tracing::error!(action, "System command timed out");
                Err(SystemCommandError::Timeout { action })
            }
        }
    }
}

/// Rewrite `uptime -p` output (`up 2 hours, 5 minutes`) for the chat.
pub fn format_uptime(raw: &str) -> String {
    raw.trim().replacen("up", "System has been up for", 1)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Point-in-time host figures for `/status`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStatus {
    pub cpu_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
    /// `None` when the sensor could not be read.
    pub temperature: Option<Celsius>,
}

/// Source of [`SystemStatus`] snapshots, minus the temperature.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn probe(&self) -> SystemStatus;
}

/// Reads CPU, memory and root-disk usage through `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProbe;

#[async_trait]
impl StatusProbe for SysinfoProbe {
    async fn probe(&self) -> SystemStatus {
        let mut sys = System::new();

        // CPU usage is a delta between two refreshes.
        sys.refresh_cpu();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let (disk_total_bytes, disk_available) = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == std::path::Path::new("/"))
            .map(|disk| (disk.total_space(), disk.available_space()))
            .unwrap_or((0, 0));

        let status = SystemStatus {
            cpu_percent: sys.global_cpu_info().cpu_usage(),
            memory_used_bytes: sys.used_memory(),
            memory_total_bytes: sys.total_memory(),
            disk_used_bytes: disk_total_bytes.saturating_sub(disk_available),
            disk_total_bytes,
            temperature: None,
        };
        tracing::debug!(?status, "System status collected");
        status
    }
}

impl SystemStatus {
    /// Chat message for `/status`.
    pub fn message(&self) -> String {
        let temperature = match self.temperature {
            Some(t) => format!("{t}°C"),
            None => "unavailable".to_string(),
        };
        format!(
            "📊 System Status\n\n\
             ⚙️ CPU Usage: {:.1}%\n\
             💾 RAM: {:.1}GB of {:.1}GB\n\
             📂 Disk: {:.1}GB of {:.1}GB\n\
             🌡️ Temperature: {temperature}",
            self.cpu_percent,
            to_gb(self.memory_used_bytes),
            to_gb(self.memory_total_bytes),
            to_gb(self.disk_used_bytes),
            to_gb(self.disk_total_bytes),
        )
    }
}

fn to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lines_are_fixed() {
        assert_eq!(SystemCommand::Uptime.program(), "uptime");
        assert_eq!(SystemCommand::Uptime.args(), ["-p"]);
        assert_eq!(SystemCommand::Reboot.program(), "sudo");
        assert_eq!(SystemCommand::Reboot.args(), ["reboot"]);
        assert_eq!(SystemCommand::Shutdown.args(), ["shutdown", "-h", "now"]);
    }

    #[test]
    fn uptime_is_reworded() {
        assert_eq!(
            format_uptime("up 3 days, 4 hours\n"),
            "System has been up for 3 days, 4 hours"
        );
    }

    #[test]
    fn failure_message_names_the_action() {
        let err = SystemCommandError::Failed {
            action: SystemCommand::Reboot.action(),
            code: 1,
            stderr: "sudo: a password is required".to_string(),
        };
        assert_eq!(err.to_string(), "Reboot failed: sudo: a password is required");
    }

    #[test]
    fn status_message_in_gigabytes() {
        let gb = 1024 * 1024 * 1024;
        let status = SystemStatus {
            cpu_percent: 12.34,
            memory_used_bytes: gb,
            memory_total_bytes: 4 * gb,
            disk_used_bytes: 10 * gb,
            disk_total_bytes: 32 * gb,
            temperature: Some(Celsius(51.2)),
        };
        assert_eq!(
            status.message(),
            "📊 System Status\n\n\
             ⚙️ CPU Usage: 12.3%\n\
             💾 RAM: 1.0GB of 4.0GB\n\
             📂 Disk: 10.0GB of 32.0GB\n\
             🌡️ Temperature: 51.2°C"
        );
    }

    #[test]
    fn status_message_without_temperature() {
        let status = SystemStatus {
            cpu_percent: 0.0,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
            disk_used_bytes: 0,
            disk_total_bytes: 0,
            temperature: None,
        };
        assert!(status.message().ends_with("Temperature: unavailable"));
    }
}
