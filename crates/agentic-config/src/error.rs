//! Configuration error types.

use thiserror::Error;

/// Errors surfaced by [`crate::RuntimeConfig`] loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML source failed to parse.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field's deserialized value is out of range or otherwise invalid.
    /// [`crate::validate`] accumulates every one of these rather than
    /// stopping at the first, so a caller sees every problem in one pass.
    #[error("invalid value for '{field}': {message}")]
    Invalid {
        /// Dotted path of the offending field (e.g. `"batching.silence_threshold_ms"`).
        field: String,
        /// Human-readable description of why the value is invalid.
        message: String,
    },
}

/// Result alias for single-error configuration operations (loading and
/// parsing). Validation instead returns `Vec<ConfigError>` — see
/// [`crate::validate`].
pub type ConfigResult<T> = Result<T, ConfigError>;
