//! Homework status codes and the verdict messages sent for them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WatchError};

/// Field holding the submission name.
pub const HOMEWORK_NAME_FIELD: &str = "homework_name";

/// Field holding the submission status code.
pub const STATUS_FIELD: &str = "status";

/// Review status of a submission, as reported by the homework API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    /// Review finished without remarks.
    Approved,
    /// A reviewer has taken the work.
    Reviewing,
    /// Review finished with remarks.
    Rejected,
}

impl HomeworkStatus {
    /// All known statuses.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Parses a status code as sent by the API. Codes are case-sensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use homework_watcher::HomeworkStatus;
    ///
    /// assert_eq!(HomeworkStatus::from_code("reviewing"), Some(HomeworkStatus::Reviewing));
    /// assert_eq!(HomeworkStatus::from_code("bogus"), None);
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "approved" => Some(Self::Approved),
            "reviewing" => Some(Self::Reviewing),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the API code for this status.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Returns the human-readable verdict for this status.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "work reviewed: no issues, approved.",
            Self::Reviewing => "work has been taken up for review.",
            Self::Rejected => "work reviewed: reviewer has remarks.",
        }
    }
}

impl std::fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Builds the notification text for one submission record.
///
/// # Errors
///
/// Returns `WatchError::MissingField` when the record has no
/// `homework_name`, and `WatchError::UnknownStatus` when `status` is absent
/// or not one of the known codes. A name that is present but not a string
/// is formatted as its JSON text.
pub fn parse_status(record: &Value) -> Result<String> {
    let name = match record.get(HOMEWORK_NAME_FIELD) {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => return Err(WatchError::missing_field(HOMEWORK_NAME_FIELD)),
    };

    let status = match record.get(STATUS_FIELD) {
        Some(Value::String(code)) => {
            HomeworkStatus::from_code(code).ok_or_else(|| WatchError::unknown_status(code))?
        }
        Some(other) => return Err(WatchError::unknown_status(other.to_string())),
        None => return Err(WatchError::unknown_status("<missing>")),
    };

    Ok(format_message(&name, status))
}

/// Formats the status-change message for a submission.
#[must_use]
pub fn format_message(name: &str, status: HomeworkStatus) -> String {
    format!("Review status changed for \"{name}\": {}", status.verdict())
}
