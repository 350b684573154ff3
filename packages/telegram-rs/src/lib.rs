// https://core.telegram.org/bots/api#sendmessage

pub mod models;

use reqwest::Client;
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    pub chat_id: i64,
}

/// Errors returned by the Bot API client.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The request never completed
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with ok=false
    #[error("telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Send an HTML-formatted message to the configured chat.
    ///
    /// Link previews are disabled; listing links would otherwise dominate
    /// every notification.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!(
            "https://api.telegram.org/bot{token}/sendMessage",
            token = self.options.bot_token
        );

        let body = serde_json::json!({
            "chat_id": self.options.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let payload = response.json::<ApiResponse>().await?;

        if !payload.ok {
            let description = payload
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(TelegramError::Api(description));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_decoded() {
        let raw = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let payload: ApiResponse = serde_json::from_str(raw).unwrap();
        assert!(!payload.ok);
        assert_eq!(
            payload.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }

    #[test]
    fn success_envelope_is_decoded() {
        let raw = r#"{"ok":true,"result":{"message_id":17,"date":1700000000}}"#;
        let payload: ApiResponse = serde_json::from_str(raw).unwrap();
        assert!(payload.ok);
        assert_eq!(payload.result.unwrap().message_id, 17);
    }
}
