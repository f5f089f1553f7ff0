//! Startup announcement.
//!
//! Tells the configured chat that the agent is online. The network is often
//! not up yet when the Pi boots, so delivery is retried on a fixed delay
//! until one attempt succeeds.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tempwatch_telegram::{ChatId, Notifier};

pub const STARTUP_MESSAGE: &str =
    "🤖 Raspberry Pi Bot is now online!\n\nSystem monitoring services are active.";

/// Delay before the first attempt.
pub const INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Delay between failed attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// Send [`STARTUP_MESSAGE`] until it is delivered or `cancel` fires.
///
/// Returns the number of attempts made, `0` if cancelled before the first.
pub async fn run(
    notifier: Arc<dyn Notifier>,
    chat_id: ChatId,
    initial_delay: Duration,
    retry_delay: Duration,
    cancel: CancellationToken,
) -> u32 {
    let mut delay = initial_delay;
    let mut attempts = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(attempts, "Startup announcement cancelled");
                return attempts;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempts += 1;
        match notifier.send(chat_id, STARTUP_MESSAGE).await {
            Ok(()) => {
                tracing::info!(attempts, "Startup announcement delivered");
                return attempts;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempts,
                    retry_in_secs = retry_delay.as_secs(),
                    "Failed to deliver startup announcement"
                );
            }
        }
        delay = retry_delay;
    }
}
