//! Errors raised by the batching pipeline.

use thiserror::Error;

/// Errors surfaced by [`crate::BatchingService`] and the types it composes.
#[derive(Debug, Error)]
pub enum BatchingError {
    /// A user's request was denied by the [`crate::HybridRateLimiter`].
    #[error("rate limit exceeded for user {user_id}")]
    RateLimitExceeded {
        /// The user whose request was denied.
        user_id: String,
    },

    /// A user's [`crate::UserBuffer`] was full and the configured
    /// [`crate::BackpressureStrategy`] rejected the message.
    #[error("backpressure rejected message under {strategy:?}")]
    BackpressureRejected {
        /// The strategy that produced the rejection.
        strategy: crate::BackpressureStrategy,
    },

    /// The user-supplied [`crate::Processor`] failed while handling a
    /// batch. Carries the cause as text; the processor's own error type is
    /// external to this crate.
    #[error("batch processing failed: {cause}")]
    ProcessingFailed {
        /// Processor failure detail.
        cause: String,
    },
}

/// Result alias for [`BatchingError`].
pub type BatchingResult<T> = Result<T, BatchingError>;
