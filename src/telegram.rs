use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::TelegramCredentials;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The request never produced an HTTP response.
    #[error("request to Telegram failed: {0}")]
    Transport(String),
    /// Telegram answered but refused the message.
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Something that can deliver a text message to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        credentials: TelegramCredentials<'_>,
        text: &str,
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Bot API client making exactly one `sendMessage` call per delivery.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    fn send_message_url(&self, bot_token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            bot_token
        )
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        credentials: TelegramCredentials<'_>,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id: credentials.chat_id,
            text,
            disable_web_page_preview: true,
        };

        debug!(api_base = %self.api_base, chat_id = %credentials.chat_id, "Sending Telegram message");

        let response = self
            .client
            .post(self.send_message_url(credentials.bot_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        // An unreadable or non-JSON body is treated as an empty object.
        let reply: Value = response
            .json()
            .await
            .unwrap_or_else(|_| Value::Object(Default::default()));

        let refused = reply.get("ok").and_then(Value::as_bool) == Some(false);
        if !status.is_success() || refused {
            let description = reply
                .get("description")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("status_{}", status.as_u16()));
            return Err(DeliveryError::Api(description));
        }

        Ok(())
    }
}
