//! Error types for sqlvc

use thiserror::Error;

/// Core error type for sqlvc operations
#[derive(Error, Debug)]
pub enum SqlvcError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SqlvcError {
    /// Whether the error came from talking to the database server
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            SqlvcError::Connection(_) | SqlvcError::Query(_) | SqlvcError::Driver(_)
        )
    }
}

/// Result type alias for sqlvc operations
pub type Result<T> = std::result::Result<T, SqlvcError>;
