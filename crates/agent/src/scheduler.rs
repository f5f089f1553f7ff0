//! Periodic driver for the temperature monitor.
//!
//! Ticks once after `first_delay`, then every `interval`. Each cycle
//! (including its delivery) completes before the next tick is awaited, so
//! only one evaluation is ever in flight. Runs until `cancel` fires.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::monitor::TemperatureMonitor;

pub async fn run(
    mut monitor: TemperatureMonitor,
    first_delay: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        first_delay_secs = first_delay.as_secs(),
        interval_secs = interval.as_secs(),
        "Temperature monitor started"
    );

    let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Temperature monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                monitor.run_cycle(Utc::now()).await;
            }
        }
    }
}
