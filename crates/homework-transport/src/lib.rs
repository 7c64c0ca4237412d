//! Homework Bot Transport
//!
//! HTTP implementations of the watcher's collaborators via reqwest.
//!
//! - [`PracticumClient`] fetches homework snapshots and implements
//!   [`homework_watcher::Fetcher`].
//! - [`TelegramNotifier`] delivers messages through the Telegram Bot API and
//!   implements [`homework_watcher::Notifier`].
//!
//! Neither client configures a request timeout.

mod practicum;
mod telegram;

pub use practicum::PracticumClient;
pub use telegram::TelegramNotifier;

use homework_watcher::WatchError;
use thiserror::Error;

/// Errors that can occur while talking to a remote HTTP service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status other than the expected one.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// The HTTP status code received.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The service understood the request but refused it.
    #[error("request rejected with HTTP {status}: {description}")]
    Rejected {
        /// The HTTP status code received.
        status: u16,
        /// The reason given by the service.
        description: String,
    },
}

impl TransportError {
    /// Converts this error into the watcher's fetch failure.
    #[must_use]
    pub fn into_fetch_error(self) -> WatchError {
        WatchError::fetch(self.to_string())
    }

    /// Converts this error into the watcher's delivery failure.
    #[must_use]
    pub fn into_delivery_error(self) -> WatchError {
        WatchError::delivery(self.to_string())
    }
}
