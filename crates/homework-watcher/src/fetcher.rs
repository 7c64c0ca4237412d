//! The capability that retrieves homework snapshots from the remote API.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Retrieves the latest API snapshot for a time cursor.
///
/// Implementations must report connection failures and non-success response
/// codes alike as `WatchError::Fetch`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches submissions updated since `cursor` (Unix seconds).
    async fn fetch(&self, cursor: i64) -> Result<Value>;
}
