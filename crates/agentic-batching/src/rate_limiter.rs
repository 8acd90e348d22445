//! Hybrid Token-Bucket + Sliding-Window admission control.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;

/// Configuration for one user's [`HybridRateLimiter`] admission test.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Token bucket capacity `C`. The bucket starts full.
    pub token_capacity: u32,
    /// Token bucket refill rate, in tokens per minute.
    pub refill_per_minute: u32,
    /// Sliding window size `N`: at most this many messages per `window`.
    pub window_max_messages: u32,
    /// Sliding window duration `W`.
    pub window: ChronoDuration,
}

impl RateLimiterConfig {
    /// Construct a rate limiter configuration.
    #[must_use]
    pub fn new(
        token_capacity: u32,
        refill_per_minute: u32,
        window_max_messages: u32,
        window: ChronoDuration,
    ) -> Self {
        Self {
            token_capacity,
            refill_per_minute,
            window_max_messages,
            window,
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(60, 60, 60, ChronoDuration::seconds(60))
    }
}

/// A lazily-refilled token bucket. Refill is computed from wall-clock
/// elapsed time rather than a background timer.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

impl TokenBucket {
    fn new(capacity: u32, now: DateTime<Utc>) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    fn refill(&mut self, now: DateTime<Utc>, config: &RateLimiterConfig) {
        let elapsed_minutes = (now - self.last_refill).num_milliseconds().max(0) as f64 / 60_000.0;
        let refilled = elapsed_minutes * f64::from(config.refill_per_minute);
        if refilled > 0.0 {
            self.tokens = (self.tokens + refilled).min(f64::from(config.token_capacity));
            self.last_refill = now;
        }
    }

    fn has_token(&self) -> bool {
        self.tokens >= 1.0
    }

    fn consume(&mut self) {
        self.tokens -= 1.0;
    }
}

/// Tracks request timestamps within a trailing window, grounded on
/// `astralis_mcp::rate_limit::WindowTracker`.
#[derive(Debug)]
struct WindowTracker {
    timestamps: Vec<DateTime<Utc>>,
}

impl WindowTracker {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn count_within(&mut self, now: DateTime<Utc>, window: ChronoDuration) -> usize {
        let window_start = now - window;
        self.timestamps.retain(|t| *t > window_start);
        self.timestamps.len()
    }

    fn record(&mut self, now: DateTime<Utc>) {
        self.timestamps.push(now);
    }
}

struct UserLimiterState {
    bucket: TokenBucket,
    window: WindowTracker,
}

impl UserLimiterState {
    fn new(config: &RateLimiterConfig, now: DateTime<Utc>) -> Self {
        Self {
            bucket: TokenBucket::new(config.token_capacity, now),
            window: WindowTracker::new(),
        }
    }
}

/// Per-user hybrid admission test: a token bucket AND a sliding window, both
/// of which must pass for `try_acquire` to succeed.
///
/// Grounded on `astralis_mcp::rate_limit::RateLimiter`'s per-key
/// `HashMap<String, WindowTracker>` behind a lock, extended with the token
/// bucket half that hybrid admission requires.
pub struct HybridRateLimiter {
    config: RateLimiterConfig,
    state: Mutex<HashMap<String, UserLimiterState>>,
}

impl HybridRateLimiter {
    /// Construct a rate limiter. Each user's bucket starts full on first
    /// contact.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to admit one message for `user_id`.
    ///
    /// Succeeds iff both the token bucket has a token available and the
    /// sliding window has not reached `window_max_messages`; on success,
    /// exactly one token is consumed and one timestamp recorded. On
    /// failure, neither subsystem is mutated.
    pub async fn try_acquire(&self, user_id: &str) -> bool {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let entry = state
            .entry(user_id.to_owned())
            .or_insert_with(|| UserLimiterState::new(&self.config, now));

        entry.bucket.refill(now, &self.config);
        let bucket_ok = entry.bucket.has_token();
        let window_count = entry.window.count_within(now, self.config.window);
        let window_ok = window_count < self.config.window_max_messages as usize;

        if bucket_ok && window_ok {
            entry.bucket.consume();
            entry.window.record(now);
            true
        } else {
            false
        }
    }

    /// Drop all per-user state (for tests).
    pub async fn reset(&self) {
        self.state.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_bucket_capacity() {
        let limiter = HybridRateLimiter::new(RateLimiterConfig::new(
            3,
            60,
            100,
            ChronoDuration::seconds(60),
        ));
        assert!(limiter.try_acquire("u1").await);
        assert!(limiter.try_acquire("u1").await);
        assert!(limiter.try_acquire("u1").await);
        assert!(!limiter.try_acquire("u1").await);
    }

    #[tokio::test]
    async fn window_limit_binds_independently_of_bucket() {
        // Bucket has plenty of capacity; the window is the binding constraint.
        let limiter = HybridRateLimiter::new(RateLimiterConfig::new(
            15,
            600,
            5,
            ChronoDuration::seconds(10),
        ));
        for _ in 0..5 {
            assert!(limiter.try_acquire("u1").await);
        }
        // The 6th through 15th are all rejected by the window even though
        // the bucket still has 10 tokens left.
        for _ in 0..9 {
            assert!(!limiter.try_acquire("u1").await);
        }
    }

    #[tokio::test]
    async fn separate_users_do_not_contend() {
        let limiter = HybridRateLimiter::new(RateLimiterConfig::new(
            1,
            60,
            1,
            ChronoDuration::seconds(60),
        ));
        assert!(limiter.try_acquire("u1").await);
        assert!(!limiter.try_acquire("u1").await);
        assert!(limiter.try_acquire("u2").await);
    }

    #[tokio::test]
    async fn rejection_does_not_consume_either_subsystem() {
        let limiter = HybridRateLimiter::new(RateLimiterConfig::new(
            5,
            60,
            1,
            ChronoDuration::seconds(60),
        ));
        assert!(limiter.try_acquire("u1").await);
        // Window now full; bucket still has 4 tokens, but the pair fails.
        assert!(!limiter.try_acquire("u1").await);
        assert!(!limiter.try_acquire("u1").await);
    }
}
