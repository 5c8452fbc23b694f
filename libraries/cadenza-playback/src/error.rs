//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Facade operations never return these; load and playback failures are
/// surfaced as session state instead. Only configuration reports errors
/// to the caller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Configuration could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration values failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
