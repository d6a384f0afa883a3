//! Homework review notifier binary entrypoint.

use tracing_subscriber::EnvFilter;

use homework_common::config::AppConfig;
use homework_notifier::TelegramNotifier;
use homework_poller::api::PracticumClient;
use homework_poller::poller::StatusPoller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("homework_poller=debug,homework_notifier=debug,homework_common=debug")
        }))
        .json()
        .init();

    tracing::info!("Homework notifier starting...");

    // Credentials are checked once, before any network activity
    let config = AppConfig::from_env()?;

    let api = PracticumClient::from_config(&config)?;
    let notifier = TelegramNotifier::from_config(&config)?;
    let start_cursor = chrono::Utc::now().timestamp();

    let mut poller = StatusPoller::new(api, notifier, config.retry_time, start_cursor);

    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await;

    tracing::info!("Homework notifier stopped.");
    Ok(())
}
