//! Retry policy and terminal handling for failed batch dispatches.

use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use crate::error::BatchingError;
use crate::message::Message;

/// Exponential backoff applied when a [`crate::Processor`] call fails,
/// mirroring `agentic_core::RetryPolicy`'s shape but kept as its own type
/// since the batching layer's exhausted-retry path calls a
/// [`TerminalHandler`] rather than propagating an error to a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorHandlingStrategy {
    /// Maximum number of processing attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Delay never exceeds this, regardless of attempt count.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl Default for ErrorHandlingStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ErrorHandlingStrategy {
    /// The crate's default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay to wait before retry attempt number `attempt` (1-indexed:
    /// `delay_for_attempt(1)` is the wait before the first retry), capped at
    /// `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_delay.as_millis() as f64) * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.round() as u64)
    }

    /// `true` if another attempt remains after `attempts_made` failures.
    #[must_use]
    pub fn has_retries_remaining(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts.saturating_sub(1)
    }
}

/// Called once a batch's retries are exhausted.
///
/// Grounded on `astrid_audit`'s pattern of a pluggable sink for events the
/// core cannot itself persist; the default implementation only logs via
/// `tracing`, matching this runtime's "e.g., dead-letter, notify user" — the
/// concrete dead-letter store or notification channel is an embedding
/// application concern.
#[async_trait]
pub trait TerminalHandler: Send + Sync {
    /// Handle a batch whose retries have been exhausted.
    async fn handle_exhausted(&self, user_id: &str, messages: &[Message], cause: &BatchingError);
}

/// A [`TerminalHandler`] that only logs. Used as the default when no
/// dead-letter store is configured.
#[derive(Debug, Default)]
pub struct LoggingTerminalHandler;

#[async_trait]
impl TerminalHandler for LoggingTerminalHandler {
    async fn handle_exhausted(&self, user_id: &str, messages: &[Message], cause: &BatchingError) {
        error!(
            user_id,
            message_count = messages.len(),
            %cause,
            "batch dead-lettered after exhausting retries"
        );
    }
}
