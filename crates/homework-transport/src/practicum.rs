//! Client for the homework status API.

use async_trait::async_trait;
use homework_watcher::{Fetcher, WatchConfig};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::TransportError;

/// Fetches homework snapshots over HTTP.
///
/// Sends `GET <endpoint>?from_date=<cursor>` with an `OAuth` authorization
/// header. Only `200 OK` with a JSON body counts as success.
#[derive(Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    /// Creates a client with its own connection pool.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint, token)
    }

    /// Creates a client sharing an existing connection pool.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Creates a client from the endpoint and token in `config`.
    #[must_use]
    pub fn from_config(client: Client, config: &WatchConfig) -> Self {
        Self::with_client(client, &config.endpoint, &config.practicum_token)
    }

    /// Returns the endpoint this client polls.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// Requests submissions updated since `from_date` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the request fails,
    /// `TransportError::UnexpectedStatus` for anything but `200 OK`, and
    /// `TransportError::Decode` if the body is not JSON.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn homework_statuses(&self, from_date: i64) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, self.authorization())
            .query(&[("from_date", from_date)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!("Homework statuses received");
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for PracticumClient {
    async fn fetch(&self, cursor: i64) -> homework_watcher::Result<Value> {
        self.homework_statuses(cursor)
            .await
            .map_err(TransportError::into_fetch_error)
    }
}
