//! Telegram Bot API delivery via `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use homework_common::config::AppConfig;
use homework_common::error::BotError;
use serde::Deserialize;

use crate::Notifier;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends plain-text messages to a single chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, timeout: Duration) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: homework_common::config::DEFAULT_TELEGRAM_API_URL.to_string(),
            bot_token,
            chat_id,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        Ok(Self::new(
            config.telegram_token.clone(),
            config.telegram_chat_id.clone(),
            config.http_timeout,
        )?
        .with_api_url(config.telegram_api_url.clone()))
    }

    /// Point the notifier at a different Bot API host.
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), BotError> {
        tracing::debug!(chat_id = %self.chat_id, "Sending Telegram message");

        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::BotDelivery(describe(e)))?;

        let status = response.status();
        let result: TelegramApiResponse = response.json().await.map_err(|e| {
            BotError::BotDelivery(format!("invalid response (HTTP {status}): {}", describe(e)))
        })?;

        if !status.is_success() || !result.ok {
            return Err(BotError::BotDelivery(format!(
                "HTTP {}: {}",
                status.as_u16(),
                result.description.unwrap_or_default()
            )));
        }

        tracing::debug!(chat_id = %self.chat_id, "Telegram message delivered");
        Ok(())
    }
}

/// Full cause chain of a reqwest error, without the request URL (it carries
/// the bot token).
fn describe(err: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::from(err.without_url()))
}
