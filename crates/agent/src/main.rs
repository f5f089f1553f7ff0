//! `tempwatch-agent` -- CPU temperature watchdog daemon.
//!
//! Reads its YAML configuration (see [`tempwatch_agent::config`]), then runs
//! three tasks until SIGINT/SIGTERM:
//!
//! - the startup announcement, retried until delivered;
//! - the temperature monitor, one cycle per interval;
//! - the Telegram command poller.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tempwatch_agent::config::AgentConfig;
use tempwatch_agent::monitor::TemperatureMonitor;
use tempwatch_agent::system::{ShellRunner, SysinfoProbe};
use tempwatch_agent::{announce, collector, commands, scheduler};
use tempwatch_telegram::{Notifier, TelegramClient};

/// How long each task gets to wind down after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tempwatch_agent=info,tempwatch_core=info,tempwatch_telegram=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::load().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let thresholds = Arc::new(config.threshold_set().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid thresholds");
        std::process::exit(1);
    }));

    let client = TelegramClient::new(&config.telegram.token).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build Telegram client");
        std::process::exit(1);
    });

    let chat_id = config.telegram.chat_id;
    let notifier: Arc<dyn Notifier> = Arc::new(client.clone());
    let source = collector::from_settings(&config.monitor);

    tracing::info!(
        chat_id,
        thresholds = thresholds.len(),
        sensor = ?config.monitor.sensor,
        "Starting tempwatch-agent"
    );

    let cancel = CancellationToken::new();

    // --- Startup announcement ---
    let announce_handle = tokio::spawn(announce::run(
        Arc::clone(&notifier),
        chat_id,
        announce::INITIAL_DELAY,
        announce::RETRY_DELAY,
        cancel.clone(),
    ));

    // --- Temperature monitor ---
    let monitor = TemperatureMonitor::new(
        Arc::clone(&source),
        Arc::clone(&notifier),
        chat_id,
        Arc::clone(&thresholds),
    );
    let monitor_handle = tokio::spawn(scheduler::run(
        monitor,
        config.monitor.first_delay(),
        config.monitor.interval(),
        cancel.clone(),
    ));

    // --- Command poller ---
    let handler = commands::CommandHandler::new(
        Arc::clone(&notifier),
        chat_id,
        source,
        Arc::new(ShellRunner),
        Arc::new(SysinfoProbe),
    );
    let poller_handle = tokio::spawn(commands::run(client, handler, cancel.clone()));

    shutdown_signal().await;

    cancel.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, monitor_handle).await;
    tracing::info!("Temperature monitor stopped");
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, poller_handle).await;
    tracing::info!("Command poller stopped");
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, announce_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM from systemd.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
