use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use homework_common::config::AppConfig;
use homework_common::error::{ApiFailure, BotError};

/// Source of homework status snapshots.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetch every status change since `from_date` (Unix timestamp).
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError>;
}

/// HTTP client for the Practicum review status endpoint.
pub struct PracticumClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    pub fn new(endpoint: String, token: String, timeout: Duration) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        Self::new(
            config.practicum_endpoint.clone(),
            config.practicum_token.clone(),
            config.http_timeout,
        )
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError> {
        tracing::debug!(from_date, endpoint = %self.endpoint, "Sending API request");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("from_date", from_date)])
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", self.token))
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiFailure::Status(status.as_u16()).into());
        }

        // A body cut short by the network is a transport failure, not bad JSON
        let body = response.bytes().await.map_err(transport_failure)?;

        serde_json::from_slice(&body)
            .map_err(|e| BotError::incorrect_response(format!("тело ответа не является JSON: {e}")))
    }
}

/// Flatten a reqwest error together with its source chain
/// (`... : tcp connect error: Connection refused`).
fn transport_failure(err: reqwest::Error) -> ApiFailure {
    ApiFailure::Transport(format!("{:#}", anyhow::Error::from(err)))
}
