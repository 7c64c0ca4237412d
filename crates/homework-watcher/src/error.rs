//! Error types for the homework watcher.
//!
//! Every failure the bot can run into has one variant here: configuration
//! problems that stop the process before polling starts, and the per-cycle
//! failures that are reported to the chat recipient and retried.

/// A specialized `Result` type for homework watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur while watching homework statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchError {
    // ========================================================================
    // Configuration Errors (fatal, startup only)
    // ========================================================================
    /// A required environment variable is absent or blank.
    #[error("Missing required configuration: {variable}\n\nSuggestion: Set {variable} in the environment or in your .env file")]
    MissingConfig {
        /// Name of the missing environment variable.
        variable: String,
    },

    /// A configuration value is present but unusable.
    #[error("Invalid configuration value for {variable}: {message}")]
    InvalidConfig {
        /// Name of the offending environment variable.
        variable: String,
        /// Description of the problem.
        message: String,
    },

    // ========================================================================
    // Cycle Errors (reported to the recipient, retried next cycle)
    // ========================================================================
    /// The homework API could not be reached or answered with a non-success status.
    #[error("homework API request failed: {message}")]
    Fetch {
        /// Description of the transport or status failure.
        message: String,
    },

    /// The decoded API response does not have the expected structure.
    #[error("unexpected API response shape: {check}")]
    Shape {
        /// Which structural check failed.
        check: ShapeCheck,
    },

    /// A submission record lacks a required field.
    #[error("submission record has no '{field}' field")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A submission record carries a status outside the known set.
    #[error("unknown homework status: {status}")]
    UnknownStatus {
        /// The status value as received.
        status: String,
    },

    // ========================================================================
    // Delivery Errors (logged only)
    // ========================================================================
    /// The chat notifier failed to deliver a message.
    #[error("failed to deliver message: {message}")]
    Delivery {
        /// Description of the delivery failure.
        message: String,
    },
}

/// Structural checks applied to an API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCheck {
    /// The response is not a key-value mapping.
    NotAnObject,
    /// The `homeworks` field is missing or not a list.
    HomeworksNotAList,
}

impl std::fmt::Display for ShapeCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "response is not an object"),
            Self::HomeworksNotAList => write!(f, "'homeworks' is not a list"),
        }
    }
}

impl WatchError {
    /// Creates a new `MissingConfig` error.
    #[must_use]
    pub fn missing_config(variable: impl Into<String>) -> Self {
        Self::MissingConfig {
            variable: variable.into(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Fetch` error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Creates a new `Shape` error.
    #[must_use]
    pub const fn shape(check: ShapeCheck) -> Self {
        Self::Shape { check }
    }

    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Creates a new `Delivery` error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Returns `true` if this error must stop the process before polling starts.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingConfig { .. } | Self::InvalidConfig { .. })
    }

    /// Returns `true` if this error is raised inside a poll cycle and gets
    /// reported to the recipient.
    #[must_use]
    pub const fn is_cycle_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::Shape { .. }
                | Self::MissingField { .. }
                | Self::UnknownStatus { .. }
        )
    }
}
