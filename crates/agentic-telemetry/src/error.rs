//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up or operating telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A [`crate::logging::LogConfig`] value was invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// `tracing-subscriber` failed to install the global subscriber.
    #[error("initialization error: {0}")]
    InitError(String),

    /// An I/O failure while setting up a file-based log target.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
