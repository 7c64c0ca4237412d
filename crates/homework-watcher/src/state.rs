//! State types for the poll loop.
//!
//! This module defines the phase the loop is in, the dedup memory of
//! what was last sent to the recipient, and the outcome of a single cycle.

use serde::{Deserialize, Serialize};

// ============================================================================
// PollPhase
// ============================================================================

/// Phase of the poll loop.
///
/// Every cycle moves `Idle` -> `Fetching` -> `Validating` -> `Notifying` and
/// back to `Idle`. A failure skips straight to `Notifying` to report it.
/// There is no terminal phase; the loop only stops when cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// Sleeping between cycles.
    #[default]
    Idle,
    /// Waiting for the homework API.
    Fetching,
    /// Checking the response and formatting the latest submission.
    Validating,
    /// Delivering a status or failure message.
    Notifying,
}

impl std::fmt::Display for PollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Validating => write!(f, "validating"),
            Self::Notifying => write!(f, "notifying"),
        }
    }
}

// ============================================================================
// NotificationState
// ============================================================================

/// Memory of the last message delivered per kind.
///
/// Status messages and failure messages have independent slots. A slot only
/// changes after a successful delivery, so a message that failed to go out
/// is attempted again on the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    last_message: Option<String>,
    last_error: Option<String>,
}

impl NotificationState {
    /// Creates a state with both slots empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use homework_watcher::NotificationState;
    ///
    /// let state = NotificationState::new();
    /// assert!(state.last_message().is_none());
    /// assert!(state.last_error().is_none());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_message: None,
            last_error: None,
        }
    }

    /// Returns the last delivered status message.
    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Returns the last delivered failure message.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `true` if `message` differs from the last delivered status message.
    #[must_use]
    pub fn is_new_message(&self, message: &str) -> bool {
        self.last_message.as_deref() != Some(message)
    }

    /// Returns `true` if `message` differs from the last delivered failure message.
    #[must_use]
    pub fn is_new_error(&self, message: &str) -> bool {
        self.last_error.as_deref() != Some(message)
    }

    /// Records a delivered status message.
    pub fn record_message(&mut self, message: impl Into<String>) {
        self.last_message = Some(message.into());
    }

    /// Records a delivered failure message.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}

// ============================================================================
// CycleOutcome
// ============================================================================

/// What happened to the message produced by a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// The notifier accepted the message.
    Sent,
    /// Identical to the previous message of the same kind; not sent.
    Suppressed,
    /// The notifier failed; the dedup slot is unchanged.
    Failed,
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API reported no submissions; nothing to notify.
    NoSubmissions,
    /// The latest submission was formatted into a status message.
    Status {
        /// The status message.
        message: String,
        /// What happened to it.
        delivery: Delivery,
    },
    /// The cycle failed; a failure message was produced.
    Failure {
        /// The failure message embedding the error description.
        message: String,
        /// What happened to it.
        delivery: Delivery,
    },
}

impl CycleOutcome {
    /// Returns `true` if this cycle invoked the notifier successfully.
    #[must_use]
    pub const fn was_sent(&self) -> bool {
        matches!(
            self,
            Self::Status {
                delivery: Delivery::Sent,
                ..
            } | Self::Failure {
                delivery: Delivery::Sent,
                ..
            }
        )
    }

    /// Returns `true` if this cycle ended in a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
