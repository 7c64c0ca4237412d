//! Homework Watcher
//!
//! Polls the homework review API, detects status changes of the most recent
//! submission and notifies a single chat recipient, suppressing repeated
//! identical notifications.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod poll_loop;
pub mod response;
pub mod state;
pub mod status;

pub use config::WatchConfig;
pub use error::{Result, ShapeCheck, WatchError};
pub use fetcher::Fetcher;
pub use notifier::Notifier;
pub use poll_loop::{failure_message, PollLoop, FAILURE_PREFIX};
pub use response::{current_date, validate_response};
pub use state::{CycleOutcome, Delivery, NotificationState, PollPhase};
pub use status::{format_message, parse_status, HomeworkStatus};
