//! Subset of the Telegram Bot API object model used by the agent.
//!
//! Only the fields we read are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};

/// Telegram chat and user identifiers are 64-bit integers.
pub type ChatId = i64;

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// One entry returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: ChatId,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
}

/// Body of a `getUpdates` call.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_update_with_text_message() {
        let raw = serde_json::json!({
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 3,
                    "from": {"id": 42, "is_bot": false, "first_name": "Pi"},
                    "chat": {"id": 42, "type": "private"},
                    "date": 1700000000,
                    "text": "/status"
                }
            }]
        });

        let response: ApiResponse<Vec<Update>> =
            serde_json::from_value(raw).expect("valid update payload");
        let updates = response.result.expect("result present");
        let message = updates[0].message.as_ref().expect("message present");
        assert_eq!(updates[0].update_id, 10);
        assert_eq!(message.from.as_ref().map(|u| u.id), Some(42));
        assert_eq!(message.text.as_deref(), Some("/status"));
    }

    #[test]
    fn parses_error_envelope() {
        let raw = serde_json::json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        });
        let response: ApiResponse<serde_json::Value> =
            serde_json::from_value(raw).expect("valid error payload");
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(401));
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }
}
