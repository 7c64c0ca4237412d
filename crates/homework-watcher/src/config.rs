//! Configuration for the homework watcher.
//!
//! All settings come from environment variables and are read once at
//! startup. Credentials and the recipient id are required; everything else
//! has a default.

use std::time::Duration;

use crate::error::{Result, WatchError};

/// Environment variable holding the homework API OAuth token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the recipient chat id.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Environment variable overriding the homework API endpoint.
pub const ENDPOINT_VAR: &str = "PRACTICUM_ENDPOINT";

/// Environment variable overriding the Telegram Bot API base URL.
pub const TELEGRAM_API_URL_VAR: &str = "TELEGRAM_API_URL";

/// Environment variable overriding the retry period, in seconds.
pub const RETRY_PERIOD_VAR: &str = "RETRY_PERIOD";

/// Default homework status endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default retry period in seconds.
const fn default_retry_period_secs() -> u64 {
    3
}

/// Process-wide configuration, immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Homework status endpoint.
    pub endpoint: String,

    /// OAuth token for the homework API.
    pub practicum_token: String,

    /// Telegram Bot API base URL.
    pub telegram_api_url: String,

    /// Telegram bot token.
    pub telegram_token: String,

    /// Chat that receives every notification.
    pub telegram_chat_id: String,

    /// Fixed pause between poll cycles.
    pub retry_period: Duration,
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("endpoint", &self.endpoint)
            .field("practicum_token", &"<redacted>")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &"<redacted>")
            .field("retry_period", &self.retry_period)
            .finish()
    }
}

impl WatchConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::MissingConfig` if a required variable is absent
    /// and `WatchError::InvalidConfig` if a value cannot be used.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as absent.
    ///
    /// # Errors
    ///
    /// Same as [`WatchConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &str| get(name).ok_or_else(|| WatchError::missing_config(name));

        let practicum_token = require(PRACTICUM_TOKEN_VAR)?;
        let telegram_token = require(TELEGRAM_TOKEN_VAR)?;
        let telegram_chat_id = require(TELEGRAM_CHAT_ID_VAR)?;

        let retry_period_secs = match get(RETRY_PERIOD_VAR) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                WatchError::invalid_config(
                    RETRY_PERIOD_VAR,
                    format!("'{raw}' is not a whole number of seconds: {e}"),
                )
            })?,
            None => default_retry_period_secs(),
        };

        let config = Self {
            endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            practicum_token,
            telegram_api_url: get(TELEGRAM_API_URL_VAR)
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            telegram_token,
            telegram_chat_id,
            retry_period: Duration::from_secs(retry_period_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// Checks that:
    /// - credentials and the chat id are not blank
    /// - both URLs are not blank
    /// - the retry period is greater than zero
    ///
    /// # Errors
    ///
    /// Returns `WatchError::MissingConfig` for blank required values and
    /// `WatchError::InvalidConfig` for the rest.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ];
        for (variable, value) in required {
            if value.trim().is_empty() {
                return Err(WatchError::missing_config(variable));
            }
        }

        if self.endpoint.trim().is_empty() {
            return Err(WatchError::invalid_config(
                ENDPOINT_VAR,
                "endpoint must not be empty",
            ));
        }

        if self.telegram_api_url.trim().is_empty() {
            return Err(WatchError::invalid_config(
                TELEGRAM_API_URL_VAR,
                "Telegram API URL must not be empty",
            ));
        }

        if self.retry_period.is_zero() {
            return Err(WatchError::invalid_config(
                RETRY_PERIOD_VAR,
                "retry period must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Returns a copy with a different retry period.
    #[must_use]
    pub const fn with_retry_period(mut self, retry_period: Duration) -> Self {
        self.retry_period = retry_period;
        self
    }
}
