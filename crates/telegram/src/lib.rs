//! Telegram Bot API plumbing for the temperature agent.
//!
//! - [`TelegramClient`] -- `sendMessage` / `getUpdates` over `reqwest`.
//! - [`Notifier`] -- the delivery seam used by the monitor and the command
//!   handler.
//! - [`types`] -- the subset of the Bot API object model we parse.

pub mod client;
pub mod notifier;
pub mod types;

pub use client::{TelegramClient, TelegramError, DEFAULT_API_BASE};
pub use notifier::Notifier;
pub use types::{ChatId, Message, Update};
