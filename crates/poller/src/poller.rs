use std::future::Future;
use std::time::Duration;

use homework_common::error::BotError;
use homework_notifier::Notifier;

use crate::api::HomeworkApi;
use crate::response::{check_response, current_date, parse_status};

/// Result of a single poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A status message for the newest homework was delivered.
    Notified,
    /// The API answered with no homework changes.
    NoChanges,
    /// The iteration failed; `notified` is `false` when the error text was a
    /// repeat of the previous one and delivery was suppressed.
    Failed { notified: bool },
}

/// Polls the review API and forwards status changes to a notifier.
///
/// Owns the two pieces of loop state: the poll cursor (lower bound of the next
/// fetch window) and the text of the last error that was sent.
pub struct StatusPoller<A, N> {
    api: A,
    notifier: N,
    retry_time: Duration,
    cursor: i64,
    last_error: Option<String>,
}

impl<A: HomeworkApi, N: Notifier> StatusPoller<A, N> {
    pub fn new(api: A, notifier: N, retry_time: Duration, start_cursor: i64) -> Self {
        Self {
            api,
            notifier,
            retry_time,
            cursor: start_cursor,
            last_error: None,
        }
    }

    /// Lower bound (Unix timestamp) used for the next fetch.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Text of the last error notification, if the poller is in the errored state.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run the poll loop until `shutdown` resolves.
    ///
    /// Every iteration is followed by the same fixed sleep, whether it
    /// succeeded or not. Shutdown may interrupt an in-flight request or the sleep.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        tracing::info!(
            cursor = self.cursor,
            retry_time_secs = self.retry_time.as_secs(),
            "Status poller started"
        );

        loop {
            let outcome = tokio::select! {
                outcome = self.tick() => outcome,
                _ = &mut shutdown => break,
            };
            tracing::debug!(?outcome, cursor = self.cursor, "Poll iteration finished");

            tokio::select! {
                _ = tokio::time::sleep(self.retry_time) => {}
                _ = &mut shutdown => break,
            }
        }

        tracing::info!(cursor = self.cursor, "Status poller stopped");
    }

    /// Run one iteration and handle its error, if any.
    pub async fn tick(&mut self) -> Outcome {
        match self.poll_once().await {
            Ok(notified) => {
                self.last_error = None;
                if notified {
                    Outcome::Notified
                } else {
                    Outcome::NoChanges
                }
            }
            Err(err) => {
                let notified = self.report_error(&err).await;
                Outcome::Failed { notified }
            }
        }
    }

    /// Fetch, validate and forward the newest status. Returns whether a
    /// message was sent.
    async fn poll_once(&mut self) -> Result<bool, BotError> {
        let response = self.api.fetch(self.cursor).await?;
        let homeworks = check_response(&response)?;

        let notified = match homeworks.first() {
            Some(newest) => {
                let message = parse_status(newest)?;
                self.notifier.send(&message).await?;
                tracing::info!(message = %message, "Homework status sent");
                true
            }
            None => false,
        };

        self.advance_cursor(current_date(&response));
        Ok(notified)
    }

    /// The cursor only moves forward; a missing `current_date` keeps it.
    fn advance_cursor(&mut self, reported: Option<i64>) {
        match reported {
            Some(date) if date >= self.cursor => self.cursor = date,
            Some(date) => {
                tracing::warn!(
                    reported = date,
                    cursor = self.cursor,
                    "Server reported a current_date behind the cursor, keeping cursor"
                );
            }
            None => tracing::debug!(cursor = self.cursor, "No current_date in response"),
        }
    }

    /// Log the error and send it unless it repeats the previous one.
    async fn report_error(&mut self, err: &BotError) -> bool {
        let message = format!("Сбой в работе программы: {err}");
        tracing::error!(severity = "critical", error = %err, "{message}");

        if self.last_error.as_deref() == Some(message.as_str()) {
            tracing::debug!("Same error already reported, notification suppressed");
            return false;
        }

        self.last_error = Some(message.clone());
        match self.notifier.send(&message).await {
            Ok(()) => true,
            Err(send_err) => {
                tracing::error!(
                    severity = "critical",
                    error = %send_err,
                    "Failed to deliver error notification"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use homework_common::error::ApiFailure;

    use super::*;

    struct ScriptedApi(Mutex<VecDeque<Result<Value, BotError>>>);

    #[async_trait]
    impl HomeworkApi for ScriptedApi {
        async fn fetch(&self, _from_date: i64) -> Result<Value, BotError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": []})))
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send(&self, _text: &str) -> Result<(), BotError> {
            Ok(())
        }
    }

    fn poller(responses: Vec<Value>, cursor: i64) -> StatusPoller<ScriptedApi, NullNotifier> {
        let script = responses.into_iter().map(Ok).collect();
        StatusPoller::new(
            ScriptedApi(Mutex::new(script)),
            NullNotifier,
            Duration::from_secs(600),
            cursor,
        )
    }

    #[tokio::test]
    async fn test_cursor_never_moves_backwards() {
        let mut p = poller(vec![json!({"homeworks": [], "current_date": 500})], 1000);
        assert_eq!(p.tick().await, Outcome::NoChanges);
        assert_eq!(p.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_cursor_ignores_non_integer_current_date() {
        let mut p = poller(vec![json!({"homeworks": [], "current_date": "2000"})], 1000);
        p.tick().await;
        assert_eq!(p.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_cursor_not_advanced_on_failure() {
        let mut p = poller(
            vec![json!({
                "homeworks": [{"homework_name": "hw1", "status": "unknown"}],
                "current_date": 2000
            })],
            1000,
        );
        assert_eq!(p.tick().await, Outcome::Failed { notified: true });
        assert_eq!(p.cursor(), 1000);
        assert!(p.last_error().unwrap().starts_with("Сбой в работе программы: "));
    }

    /// In-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn lines_containing(&self, needle: &str) -> usize {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains(needle))
                .count()
        }
    }

    #[tokio::test]
    async fn test_suppressed_error_is_still_logged_as_critical() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .json()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let refused = || -> Result<Value, BotError> {
            Err(ApiFailure::Transport("connection refused".into()).into())
        };
        let mut p = StatusPoller::new(
            ScriptedApi(Mutex::new(VecDeque::from([refused(), refused()]))),
            NullNotifier,
            Duration::from_secs(600),
            1000,
        );

        assert_eq!(p.tick().await, Outcome::Failed { notified: true });
        assert_eq!(p.tick().await, Outcome::Failed { notified: false });

        assert_eq!(logs.lines_containing(r#""severity":"critical""#), 2);
        assert_eq!(logs.lines_containing("notification suppressed"), 1);
    }
}
