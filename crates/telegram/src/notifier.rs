//! Outbound message delivery seam.
//!
//! The monitor and the command handler only need "send this text to that
//! chat". [`Notifier`] captures that so they can be driven by a recording
//! fake in tests, while [`TelegramClient`] is the production implementation.

use async_trait::async_trait;

use crate::client::{TelegramClient, TelegramError};
use crate::types::ChatId;

/// Delivers a plain-text message to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError>;
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        self.send_message(chat_id, text).await
    }
}
