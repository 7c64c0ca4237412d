//! The capability that delivers text messages to the chat recipient.

use async_trait::async_trait;

use crate::error::Result;

/// Delivers a message to a single fixed recipient.
///
/// Implementations report every failure as `WatchError::Delivery`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to the recipient.
    async fn send(&self, text: &str) -> Result<()>;
}
