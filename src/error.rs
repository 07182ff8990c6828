//! Error types for the backup lister.
//!
//! Every failure is classified into exactly one of three categories, each
//! with its own stable process exit status.

use thiserror::Error;

/// Main error type for backup listing.
#[derive(Error, Debug)]
pub enum BackupError {
    /// No usable database client driver, or an unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database layer rejected the connection or the statement.
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else (malformed input, broken output stream, runtime failure).
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BackupError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates an unexpected error with the given message.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Database(_) => "Database Error",
            Self::Unexpected(_) => "Unexpected Error",
        }
    }

    /// Process exit status for this error. Other tooling depends on these values.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Database(_) => 2,
            Self::Unexpected(_) => 3,
        }
    }

    /// Formats the single diagnostic line written to stderr.
    pub fn diagnostic(&self) -> String {
        let message = match self {
            Self::Config(msg) | Self::Database(msg) | Self::Unexpected(msg) => msg,
        };
        match self {
            Self::Config(_) => format!(
                "backup-lister: {}: {} (hint: install the Microsoft ODBC Driver for SQL Server or set `driver` in the config file)",
                self.category(),
                message
            ),
            _ => format!("backup-lister: {}: {}", self.category(), message),
        }
    }
}

impl From<tiberius::error::Error> for BackupError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Server(token) => Self::Database(format!(
                "{} (code {}, state {})",
                token.message(),
                token.code(),
                token.state()
            )),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Result type alias using BackupError.
pub type Result<T> = std::result::Result<T, BackupError>;
