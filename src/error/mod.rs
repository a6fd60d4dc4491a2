use crate::query_builder::platforms::PlatformKind;
use thiserror::Error;

pub mod logging;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export logging types for easy access
pub use logging::{ErrorLogger, LogConfig, LogEntry, LogLevel, LogOutput, QueryErrorEvent, QueryErrorSink};

/// Main error type for the query layer
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed builder call: unsupported operator, rejected value, missing table...
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(PlatformKind),

    /// The driver could not establish a handle. Never retried by this crate.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Compiled SQL rejected by the driver
    #[error("Query failed: {message} [SQL: {sql}]")]
    Query { sql: String, message: String },

    #[error("Query timed out after {seconds}s [SQL: {sql}]")]
    Timeout { sql: String, seconds: u64 },

    /// Raw driver failure, converted into `Query` once the SQL is known
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attach the SQL text to a driver-level failure
    pub fn with_sql(self, sql: &str) -> Self {
        match self {
            Error::Driver(message) => Error::Query {
                sql: sql.to_string(),
                message,
            },
            other => other,
        }
    }

    /// The SQL text carried by this error, if any
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query { sql, .. } | Error::Timeout { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Check if error is retryable
    ///
    /// Informational only; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Timeout { .. })
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "E_INVALID_ARGUMENT",
            Error::UnsupportedPlatform(_) => "E_UNSUPPORTED_PLATFORM",
            Error::Connection(_) => "E_DB_CONNECTION",
            Error::Query { .. } => "E_DB_QUERY",
            Error::Timeout { .. } => "E_TIMEOUT",
            Error::Driver(_) => "E_DB_DRIVER",
            Error::Config(_) => "E_CONFIG",
            Error::Json(_) => "E_JSON",
            Error::Io(_) => "E_IO",
        }
    }
}
