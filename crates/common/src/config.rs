use std::time::Duration;

use crate::error::BotError;

/// Review status endpoint of the Practicum API.
pub const DEFAULT_PRACTICUM_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Pause between two poll iterations (10 minutes).
pub const DEFAULT_RETRY_TIME_SECS: u64 = 600;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Credentials the process refuses to start without.
pub const REQUIRED_TOKENS: [&str; 3] = ["PRACTICUM_TOKEN", "TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"];

/// Application configuration loaded once at startup from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    /// OAuth token for the review API
    pub practicum_token: String,

    /// Telegram bot token
    pub telegram_token: String,

    /// Chat that receives the notifications
    pub telegram_chat_id: String,

    /// Review status endpoint
    pub practicum_endpoint: String,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Fixed sleep between iterations
    pub retry_time: Duration,

    /// Per-request timeout for both HTTP collaborators
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self, BotError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BotError> {
        if !check_tokens(&lookup) {
            let missing = missing_tokens(&lookup);
            let err = BotError::ConfigMissing(missing);
            tracing::error!(severity = "critical", error = %err, "Configuration check failed");
            return Err(err);
        }

        let required = |key: &'static str| lookup(key).ok_or(BotError::ConfigMissing(vec![key]));

        Ok(Self {
            practicum_token: required("PRACTICUM_TOKEN")?,
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            practicum_endpoint: lookup("PRACTICUM_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_PRACTICUM_ENDPOINT.to_string()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            retry_time: Duration::from_secs(parse_secs(
                &lookup,
                "RETRY_TIME",
                DEFAULT_RETRY_TIME_SECS,
            )?),
            http_timeout: Duration::from_secs(parse_secs(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("practicum_endpoint", &self.practicum_endpoint)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("retry_time", &self.retry_time)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Returns `true` when every required credential is present.
///
/// A variable set to an empty string still counts as present.
pub fn check_tokens(lookup: impl Fn(&str) -> Option<String>) -> bool {
    tracing::debug!("Checking required environment variables");
    missing_tokens(lookup).is_empty()
}

/// Names of the required credentials that are not set.
pub fn missing_tokens(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    REQUIRED_TOKENS
        .into_iter()
        .filter(|key| lookup(key).is_none())
        .collect()
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, BotError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{key} must be a valid u64, got {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PRACTICUM_TOKEN", "practicum-secret"),
            ("TELEGRAM_TOKEN", "telegram-secret"),
            ("TELEGRAM_CHAT_ID", "123456"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(config.practicum_token, "practicum-secret");
        assert_eq!(config.telegram_chat_id, "123456");
        assert_eq!(config.practicum_endpoint, DEFAULT_PRACTICUM_ENDPOINT);
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.retry_time, Duration::from_secs(600));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let mut env = full_env();
        env.push(("RETRY_TIME", "5"));
        env.push(("PRACTICUM_ENDPOINT", "http://localhost:8080/statuses/"));
        let config = AppConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.retry_time, Duration::from_secs(5));
        assert_eq!(config.practicum_endpoint, "http://localhost:8080/statuses/");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let env = [("PRACTICUM_TOKEN", "x")];
        let err = AppConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert_eq!(
            err,
            BotError::ConfigMissing(vec!["TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"])
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_check_tokens() {
        assert!(check_tokens(lookup_from(&full_env())));
        assert!(!check_tokens(lookup_from(&[])));
        assert_eq!(missing_tokens(lookup_from(&[])), REQUIRED_TOKENS.to_vec());
    }

    #[test]
    fn test_empty_token_counts_as_present() {
        let env = [
            ("PRACTICUM_TOKEN", ""),
            ("TELEGRAM_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "1"),
        ];
        assert!(check_tokens(lookup_from(&env)));
    }

    #[test]
    fn test_invalid_retry_time() {
        let mut env = full_env();
        env.push(("RETRY_TIME", "ten minutes"));
        let err = AppConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = AppConfig::from_lookup(lookup_from(&full_env())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("practicum-secret"));
        assert!(!debug.contains("telegram-secret"));
        assert!(debug.contains("123456"));
    }
}
