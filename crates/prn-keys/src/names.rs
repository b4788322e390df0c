//! Validation of caller-supplied names that become key segments.
//!
//! Event names and uploaded file names are spliced into object keys, so
//! they must stay within a single segment:
//! - Must be non-empty
//! - Must not contain `/`, `\`, or control characters
//! - Must not start with `.` (which also rules out `.` and `..`)
//!
//! Spaces and other printable characters are allowed.

use crate::error::{KeyError, Result};

fn invalid(name: &str, reason: impl Into<String>) -> KeyError {
    KeyError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn validate_segment(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, format!("{what} must not be empty")));
    }

    if let Some(ch) = name
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.starts_with('.') {
        return Err(invalid(name, "must not start with '.'"));
    }

    Ok(())
}

/// Validate an event name, returning `Ok(())` if it can be used as a key segment.
///
/// # Examples
///
/// ```
/// use prn_keys::names::validate_event_name;
///
/// assert!(validate_event_name("hurricane-maria").is_ok());
/// assert!(validate_event_name("").is_err());
/// assert!(validate_event_name("a/b").is_err());
/// ```
pub fn validate_event_name(name: &str) -> Result<()> {
    validate_segment(name, "event name")
}

/// Validate an uploaded file name. Same rules as event names.
pub fn validate_file_name(name: &str) -> Result<()> {
    validate_segment(name, "file name")
}
