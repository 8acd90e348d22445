//! Errors raised by a [`crate::Responder`].

use thiserror::Error;

/// Errors that can occur while talking to an LLM backend.
///
/// Grounded on `astrid_llm::error::LlmError`'s variant set; trimmed to what
/// a transport-opaque Responder boundary needs and tagged with an HTTP-style
/// status where the transport exposes one, so `agentic_core::RetryPolicy`
/// can classify it.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured for this provider.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// The transport returned a non-success status.
    #[error("API request failed (status={status_code:?}): {message}")]
    ApiRequestFailed {
        /// HTTP-style status code, if known.
        status_code: Option<u16>,
        /// Human-readable detail.
        message: String,
    },

    /// The provider rejected the request for exceeding its rate limit.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        /// Seconds to wait before retrying, if the provider specified one.
        retry_after_secs: u64,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The requested model is not one this provider serves.
    #[error("model not supported: {model}")]
    ModelNotSupported {
        /// The offending model name.
        model: String,
    },

    /// The request exceeded the model's context window.
    #[error("context length exceeded: {current} tokens, max is {max}")]
    ContextLengthExceeded {
        /// Tokens in the request.
        current: usize,
        /// The model's maximum.
        max: usize,
    },

    /// The stream ended abnormally or emitted a malformed event.
    #[error("streaming error: {0}")]
    StreamingError(String),

    /// The request or response body failed to (de)serialize.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The call exceeded its configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Provider configuration was invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// HTTP-style status code this error carries, if any — used by
    /// `agentic_core::RetryPolicy::is_retryable_status`.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiRequestFailed { status_code, .. } => *status_code,
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result alias for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
