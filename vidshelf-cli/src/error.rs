use thiserror::Error;

use vidshelf_db::StoreError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error outside the database (directory listing)
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Key, file or series that the command needs does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Arguments that parse but make no sense together
    #[error("Invalid arguments: {0}")]
    Usage(String),
}

impl CliError {
    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}
