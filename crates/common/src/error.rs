use thiserror::Error;

/// Why the review API could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// Connection refused, DNS failure, timeout and other transport errors.
    #[error("{0}")]
    Transport(String),

    /// The endpoint answered with something other than `200 OK`.
    #[error("код ответа сервера {0}")]
    Status(u16),
}

/// Error kinds shared by every step of the notifier.
///
/// The `Display` text of a variant is what ends up in the chat, so two errors
/// with identical text are treated as the same failure by the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
    #[error("Отсутствует обязательная переменная окружения: {}", .0.join(", "))]
    ConfigMissing(Vec<&'static str>),

    #[error("Некорректная конфигурация: {0}")]
    Config(String),

    #[error("API недоступен, {0}")]
    ApiUnavailable(#[from] ApiFailure),

    #[error("Некорректный ответ API, {0}")]
    IncorrectApiResponse(String),

    #[error("Ошибка отправки сообщения Telegram. {0}")]
    BotDelivery(String),
}

impl BotError {
    /// Fatal errors stop the process before the poll loop starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::ConfigMissing(_) | BotError::Config(_))
    }

    pub fn incorrect_response(reason: impl Into<String>) -> Self {
        BotError::IncorrectApiResponse(reason.into())
    }
}
