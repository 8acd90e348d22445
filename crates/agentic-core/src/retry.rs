//! Retry backoff for Responder transport failures.

use std::time::Duration;

/// Exponential backoff with a status-code allowlist, applied by
/// `agentic-llm` around each Responder call.
///
/// Grounded on `astrid_llm::provider::ProviderConfig`'s plain, cloneable
/// config-struct convention; the defaults are .
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (non-retry) one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Delay is never allowed to exceed this, regardless of attempt count.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// HTTP status codes considered transient and thus retryable.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            retryable_statuses: vec![429, 500, 502, 503, 504, 529],
        }
    }
}

impl RetryPolicy {
    /// The default retry policy, spelled out for readability at call sites.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if a Responder failure carrying this HTTP status should be
    /// retried. A missing status (e.g. a connection-level failure) is
    /// always treated as retryable.
    #[must_use]
    pub fn is_retryable_status(&self, status_code: Option<u16>) -> bool {
        match status_code {
            Some(code) => self.retryable_statuses.contains(&code),
            None => true,
        }
    }

    /// Delay to wait before attempt number `attempt` (1-indexed: the delay
    /// before the *first* retry is `delay_for_attempt(1)`), capped at
    /// `max_delay` and non-decreasing in `attempt`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_delay.as_millis() as f64) * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.round() as u64)
    }

    /// `true` once `attempts_made` has exhausted `max_attempts`.
    #[must_use]
    pub fn is_exhausted(&self, attempts_made: u32) -> bool {
        attempts_made >= self.max_attempts
    }
}
