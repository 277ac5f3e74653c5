//! Error types for the calendar engine.

use thiserror::Error;

/// Errors raised at the engine boundary.
///
/// Binding and layout never fail; everything here is about rejecting
/// malformed input before it reaches the grid math.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("event is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid {field} '{value}': expected HH:MM")]
    InvalidTime { field: &'static str, value: String },

    #[error("unknown view mode '{0}' (expected month, week or day)")]
    InvalidViewMode(String),

    #[error("invalid config value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },
}

/// Result type alias for engine operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
