//! Error types shared by the library and the binary.

use thiserror::Error;

/// Errors raised while computing a schedule.
///
/// These signal a programming or configuration mistake in the caller, never a
/// recoverable runtime condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time '{0}', expected HH:MM (24-hour)")]
    InvalidTime(String),
    #[error("day of week {0} is out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidDayOfWeek(u8),
    #[error("day of month {0} is out of range (1..=31)")]
    InvalidDayOfMonth(u8),
    #[error("frequency '{0}' is not supported")]
    UnsupportedFrequency(&'static str),
    #[error("date arithmetic overflowed")]
    OutOfRange,
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for store and command operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("template {0} not found")]
    TemplateNotFound(u64),
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    #[error("tag '{0}' already exists")]
    TagExists(String),
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl Error {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
