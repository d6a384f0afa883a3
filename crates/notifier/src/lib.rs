//! Notification delivery.
//!
//! The poll loop only knows about the [`Notifier`] trait; the production
//! implementation is [`telegram::TelegramNotifier`].

pub mod telegram;

use async_trait::async_trait;
use homework_common::error::BotError;

pub use telegram::TelegramNotifier;

/// Something that can deliver a text message to the configured destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver exactly one message. Every failure is reported as
    /// [`BotError::BotDelivery`]; no retry is attempted.
    async fn send(&self, text: &str) -> Result<(), BotError>;
}
