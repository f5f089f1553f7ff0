//! Chat commands.
//!
//! Long-polls Telegram for updates and answers the commands sent by the
//! configured user. Messages from anyone else are logged and dropped.
//! The poll loop reconnects on a fixed delay after any transport error and
//! runs until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tempwatch_telegram::{ChatId, Message, Notifier, TelegramClient, TelegramError, Update};

use crate::collector::MetricSource;
use crate::system::{format_uptime, StatusProbe, SystemCommand, SystemRunner};

/// Delay before polling again after a failed `getUpdates`.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Long-poll window passed to `getUpdates`.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);

pub const HELP_TEXT: &str = "Available commands:\n\
    /status - Check system metrics\n\
    /uptime - Check system uptime\n\
    /reboot - Restart the system\n\
    /shutdown - Shutdown the system";

pub const REBOOT_NOTICE: &str = "🔄 Rebooting the system... This can take up to 3 minutes";
pub const SHUTDOWN_NOTICE: &str = "🔄 Shutting down the system...";
pub const GENERIC_ERROR: &str = "❌ An error occurred while processing your request.";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Status,
    Uptime,
    Reboot,
    Shutdown,
}

impl BotCommand {
    /// Parse the leading `/command` (or `/command@botname`) of a message.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);

        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "uptime" => Some(Self::Uptime),
            "reboot" => Some(Self::Reboot),
            "shutdown" => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// Only the configured user may drive the bot.
pub fn is_authorized(message: &Message, chat_id: ChatId) -> bool {
    message.from.as_ref().is_some_and(|user| user.id == chat_id)
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Executes authorized commands and sends the replies.
pub struct CommandHandler {
    notifier: Arc<dyn Notifier>,
    chat_id: ChatId,
    source: Arc<dyn MetricSource>,
    runner: Arc<dyn SystemRunner>,
    probe: Arc<dyn StatusProbe>,
}

impl CommandHandler {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        chat_id: ChatId,
        source: Arc<dyn MetricSource>,
        runner: Arc<dyn SystemRunner>,
        probe: Arc<dyn StatusProbe>,
    ) -> Self {
        Self {
            notifier,
            chat_id,
            source,
            runner,
            probe,
        }
    }

    /// Handle one update. Returns the command that was executed, if any.
    pub async fn handle_update(&self, update: &Update) -> Option<BotCommand> {
        let message = update.message.as_ref()?;
        let command = BotCommand::parse(message.text.as_deref()?)?;
        let user_id = message.from.as_ref().map(|user| user.id);

        if !is_authorized(message, self.chat_id) {
            tracing::warn!(?user_id, ?command, "Unauthorized access attempt");
            return None;
        }

        tracing::info!(?user_id, ?command, "Command received");
        let reply_to = message.chat.id;

        if let Err(e) = self.execute(command, reply_to).await {
            tracing::error!(error = %e, ?command, "Failed to answer command");
            if let Err(e) = self.notifier.send(reply_to, GENERIC_ERROR).await {
                tracing::error!(error = %e, "Could not send error message to user");
            }
        }
        Some(command)
    }

    async fn execute(&self, command: BotCommand, reply_to: ChatId) -> Result<(), TelegramError> {
        match command {
            BotCommand::Start | BotCommand::Help => self.notifier.send(reply_to, HELP_TEXT).await,
            BotCommand::Status => {
                let mut status = self.probe.probe().await;
                status.temperature = match self.source.read().await {
                    Ok(reading) => Some(reading),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read CPU temperature for status");
                        None
                    }
                };
                self.notifier.send(reply_to, &status.message()).await
            }
            BotCommand::Uptime => {
                let reply = match self.runner.run(SystemCommand::Uptime).await {
                    Ok(output) => format_uptime(&output),
                    Err(e) => format!("❌ Error: {e}"),
                };
                self.notifier.send(reply_to, &reply).await
            }
            BotCommand::Reboot => {
                self.notify_then_run(reply_to, REBOOT_NOTICE, SystemCommand::Reboot)
                    .await
            }
            BotCommand::Shutdown => {
                self.notify_then_run(reply_to, SHUTDOWN_NOTICE, SystemCommand::Shutdown)
                    .await
            }
        }
    }

    /// Warn the user first: a successful reboot or shutdown never returns.
    async fn notify_then_run(
        &self,
        reply_to: ChatId,
        notice: &str,
        command: SystemCommand,
    ) -> Result<(), TelegramError> {
        self.notifier.send(reply_to, notice).await?;
        match self.runner.run(command).await {
            Ok(_) => Ok(()),
            Err(e) => self.notifier.send(reply_to, &format!("❌ Error: {e}")).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Poll for updates and dispatch them until `cancel` fires.
pub async fn run(client: TelegramClient, handler: CommandHandler, cancel: CancellationToken) {
    tracing::info!("Command poller started");
    let mut offset: Option<i64> = None;

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = client.get_updates(offset, POLL_TIMEOUT) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in &updates {
                    offset = Some(next_offset(offset, update.update_id));
                    handler.handle_update(update).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to poll Telegram updates");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Command poller stopping");
}

/// Offset acknowledging `update_id` and everything before it.
fn next_offset(current: Option<i64>, update_id: i64) -> i64 {
    current.map_or(update_id + 1, |offset| offset.max(update_id + 1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempwatch_telegram::types::{Chat, User};

    use super::*;

    fn message_from(user_id: ChatId, text: &str) -> Message {
        Message {
            message_id: 1,
            from: Some(User {
                id: user_id,
                is_bot: false,
                username: None,
            }),
            chat: Chat { id: user_id },
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(BotCommand::parse("/status"), Some(BotCommand::Status));
        assert_eq!(BotCommand::parse("/uptime now"), Some(BotCommand::Uptime));
        assert_eq!(BotCommand::parse("  /help"), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("/reboot@pi_bot"), Some(BotCommand::Reboot));
    }

    #[test]
    fn ignores_unknown_or_plain_text() {
        assert_eq!(BotCommand::parse("status"), None);
        assert_eq!(BotCommand::parse("/unknown"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn only_configured_user_is_authorized() {
        assert!(is_authorized(&message_from(42, "/status"), 42));
        assert!(!is_authorized(&message_from(7, "/status"), 42));

        let mut anonymous = message_from(42, "/status");
        anonymous.from = None;
        assert!(!is_authorized(&anonymous, 42));
    }

    #[test]
    fn offset_moves_past_latest_update() {
        assert_eq!(next_offset(None, 10), 11);
        assert_eq!(next_offset(Some(11), 12), 13);
        assert_eq!(next_offset(Some(20), 12), 20);
    }
}
