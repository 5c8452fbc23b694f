//! Core error types for Cadenza

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Cadenza
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input did not have the expected shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON parsing errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
