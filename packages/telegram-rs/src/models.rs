//! Response shapes for the Telegram Bot API.

use serde::Deserialize;

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,

    #[serde(default)]
    pub error_code: Option<i64>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub result: Option<SentMessage>,
}

/// The subset of the Message object we care about.
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,

    #[serde(default)]
    pub date: Option<i64>,
}
