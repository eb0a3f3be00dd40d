//! Error type shared by the pool and both stores.

use std::time::Duration;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file stayed locked past the busy timeout.
    #[error("Database is busy: {0}")]
    Busy(rusqlite::Error),

    /// Any other SQLite failure (permissions, disk, corruption, bad SQL).
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No pooled connection became available within {0:?}")]
    PoolTimeout(Duration),

    #[error("Connection pool is closed")]
    PoolClosed,

    /// The pool could not establish its warm connections.
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl StoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for lock contention, which callers may retry with backoff.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Self::Busy(err),
            _ => Self::Sqlite(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
