//! Structural validation of homework API responses.

use serde_json::Value;

use crate::error::{Result, ShapeCheck, WatchError};

/// Field holding the list of submission records, most recent first.
pub const HOMEWORKS_FIELD: &str = "homeworks";

/// Field holding the server time the response was produced at.
pub const CURRENT_DATE_FIELD: &str = "current_date";

/// Checks that a decoded response has the documented shape and returns its
/// submission records in their original order.
///
/// # Errors
///
/// Returns `WatchError::Shape` naming the failed check when the response is
/// not an object or its `homeworks` field is absent or not a list.
///
/// # Examples
///
/// ```
/// use homework_watcher::validate_response;
/// use serde_json::json;
///
/// let response = json!({"homeworks": [], "current_date": 1000});
/// assert!(validate_response(&response).unwrap().is_empty());
///
/// assert!(validate_response(&json!([])).is_err());
/// ```
pub fn validate_response(response: &Value) -> Result<&[Value]> {
    let fields = response
        .as_object()
        .ok_or_else(|| WatchError::shape(ShapeCheck::NotAnObject))?;

    fields
        .get(HOMEWORKS_FIELD)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| WatchError::shape(ShapeCheck::HomeworksNotAList))
}

/// Extracts the server-reported time from a response.
///
/// Returns `None` when the field is absent or not an integer.
pub fn current_date(response: &Value) -> Option<i64> {
    response.get(CURRENT_DATE_FIELD).and_then(Value::as_i64)
}
