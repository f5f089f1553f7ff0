//! Telegram Bot API client.
//!
//! [`TelegramClient`] posts JSON to `https://api.telegram.org/bot<token>/`
//! methods. It covers the two calls the agent needs: `sendMessage` for
//! alerts and replies, and `getUpdates` for long-polling chat commands.
//! Each call is a single attempt; callers decide whether to retry.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{ApiResponse, ChatId, GetUpdates, SendMessage, Update};

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// HTTP request timeout for a single non-polling call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra headroom on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const POLL_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for Bot API failures.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Telegram returned HTTP {0}")]
    HttpStatus(u16),

    /// The API answered `"ok": false`.
    #[error("Telegram API error: {0}")]
    Api(String),
}

// ---------------------------------------------------------------------------
// TelegramClient
// ---------------------------------------------------------------------------

/// Thin wrapper around `reqwest` bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    /// `<api_base>/bot<token>`, without a trailing slash.
    endpoint: String,
}

impl TelegramClient {
    /// Create a client for the public Bot API.
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Create a client against a custom API base (local Bot API server or a
    /// test double).
    pub fn with_api_base(api_base: &str, token: &str) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    /// Send a plain-text message to a chat.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        let body = SendMessage { chat_id, text };
        self.call::<_, serde_json::Value>("sendMessage", &body, None)
            .await?;
        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Long-poll for new updates.
    ///
    /// `offset` must be one greater than the highest `update_id` already
    /// handled so Telegram drops confirmed updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Option<Vec<Update>> = self
            .call("getUpdates", &body, Some(timeout + POLL_TIMEOUT_SLACK))
            .await?;
        Ok(updates.unwrap_or_default())
    }

    /// Execute a single POST and unwrap the API envelope.
    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<Option<T>, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{method}", self.endpoint))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::HttpStatus(status.as_u16()));
        }

        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "request rejected without description".to_string()),
            ));
        }
        Ok(envelope.result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _client = TelegramClient::new("123:abc").expect("client builds");
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client =
            TelegramClient::with_api_base("http://localhost:8081/", "123:abc").expect("client");
        assert_eq!(client.endpoint, "http://localhost:8081/bot123:abc");
    }

    #[test]
    fn telegram_error_display_http_status() {
        let err = TelegramError::HttpStatus(502);
        assert_eq!(err.to_string(), "Telegram returned HTTP 502");
    }

    #[test]
    fn telegram_error_display_request() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = TelegramError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
