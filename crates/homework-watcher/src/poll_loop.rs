//! The polling loop.
//!
//! [`PollLoop`] owns the time cursor and the notification dedup state. Each
//! cycle fetches a snapshot, validates it, formats the most recent
//! submission and notifies the recipient when the message changed. Any
//! failure inside a cycle is turned into a failure message, deduplicated the
//! same way, and never ends the loop.

use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::WatchConfig;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::notifier::Notifier;
use crate::response::{current_date, validate_response};
use crate::state::{CycleOutcome, Delivery, NotificationState, PollPhase};
use crate::status::parse_status;

/// Prefix of every failure message sent to the recipient.
pub const FAILURE_PREFIX: &str = "Program failure: ";

/// Builds the failure message reported for a cycle error.
#[must_use]
pub fn failure_message(error: &impl std::fmt::Display) -> String {
    format!("{FAILURE_PREFIX}{error}")
}

/// Polls the homework API and notifies the recipient of changes.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use homework_watcher::{Fetcher, Notifier, PollLoop};
/// use tokio_util::sync::CancellationToken;
///
/// async fn watch(fetcher: impl Fetcher, notifier: impl Notifier) {
///     let token = CancellationToken::new();
///     PollLoop::new(fetcher, notifier, Duration::from_secs(3))
///         .run(token)
///         .await;
/// }
/// ```
pub struct PollLoop<F, N> {
    fetcher: F,
    notifier: N,
    retry_period: Duration,
    cursor: i64,
    state: NotificationState,
    phase: PollPhase,
}

impl<F, N> PollLoop<F, N>
where
    F: Fetcher,
    N: Notifier,
{
    /// Creates a loop whose cursor starts at the current time.
    pub fn new(fetcher: F, notifier: N, retry_period: Duration) -> Self {
        Self {
            fetcher,
            notifier,
            retry_period,
            cursor: Utc::now().timestamp(),
            state: NotificationState::new(),
            phase: PollPhase::Idle,
        }
    }

    /// Creates a loop using the retry period from `config`.
    pub fn from_config(config: &WatchConfig, fetcher: F, notifier: N) -> Self {
        Self::new(fetcher, notifier, config.retry_period)
    }

    /// Starts the cursor at `cursor` instead of the current time.
    #[must_use]
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    /// Returns the lower bound of the next fetch window.
    pub const fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Returns the current phase.
    pub const fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Returns the dedup state.
    pub const fn state(&self) -> &NotificationState {
        &self.state
    }

    /// Returns the pause between cycles.
    pub const fn retry_period(&self) -> Duration {
        self.retry_period
    }

    /// Runs cycles until `token` is cancelled, sleeping the retry period
    /// after every cycle regardless of its outcome.
    ///
    /// Cancellation is checked before each cycle and ends the sleep early.
    /// A cycle that has started always runs to completion. Returns the
    /// stopped loop.
    pub async fn run(mut self, token: CancellationToken) -> Self {
        info!(
            cursor = self.cursor,
            retry_period_secs = self.retry_period.as_secs_f64(),
            "Polling started"
        );

        while !token.is_cancelled() {
            let outcome = self.run_cycle().await;
            debug!(?outcome, cursor = self.cursor, "Cycle finished");

            tokio::select! {
                () = token.cancelled() => break,
                () = sleep(self.retry_period) => {}
            }
        }

        info!(cursor = self.cursor, "Polling stopped");
        self
    }

    /// Runs a single cycle without the trailing sleep.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = match self.check_latest().await {
            Ok(None) => {
                debug!(cursor = self.cursor, "No submissions reported");
                CycleOutcome::NoSubmissions
            }
            Ok(Some(message)) => {
                let delivery = self.deliver_status(&message).await;
                CycleOutcome::Status { message, delivery }
            }
            Err(err) => {
                error!(error = %err, cursor = self.cursor, "Poll cycle failed");
                let message = failure_message(&err);
                let delivery = self.deliver_failure(&message).await;
                CycleOutcome::Failure { message, delivery }
            }
        };

        self.phase = PollPhase::Idle;
        outcome
    }

    /// Fetches, validates and formats the most recent submission.
    ///
    /// The cursor moves as soon as the fetch succeeds, before validation.
    async fn check_latest(&mut self) -> Result<Option<String>> {
        self.phase = PollPhase::Fetching;
        let response = self.fetcher.fetch(self.cursor).await?;

        if let Some(date) = current_date(&response) {
            self.cursor = date;
        }

        self.phase = PollPhase::Validating;
        let homeworks = validate_response(&response)?;
        homeworks.first().map(parse_status).transpose()
    }

    async fn deliver_status(&mut self, message: &str) -> Delivery {
        if !self.state.is_new_message(message) {
            debug!(text = message, "Status unchanged, not sending");
            return Delivery::Suppressed;
        }

        match self.send(message).await {
            Ok(()) => {
                self.state.record_message(message);
                Delivery::Sent
            }
            Err(_) => Delivery::Failed,
        }
    }

    async fn deliver_failure(&mut self, message: &str) -> Delivery {
        if !self.state.is_new_error(message) {
            debug!(text = message, "Failure already reported, not sending");
            return Delivery::Suppressed;
        }

        match self.send(message).await {
            Ok(()) => {
                self.state.record_error(message);
                Delivery::Sent
            }
            Err(_) => Delivery::Failed,
        }
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        self.phase = PollPhase::Notifying;
        debug!(text, "Sending message");

        match self.notifier.send(text).await {
            Ok(()) => {
                debug!("Message sent");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Failed to send message");
                Err(err)
            }
        }
    }
}
