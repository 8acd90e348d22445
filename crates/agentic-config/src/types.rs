//! Configuration schema for the agentic runtime.
//!
//! This crate has no dependency on `agentic-core`, `agentic-loop`,
//! `agentic-window`, or `agentic-batching` — mirroring `astrid_config`'s
//! design note that the configuration crate stays self-contained and
//! conversion to domain types happens at the embedding application's
//! boundary. Every section implements [`Default`] with sensible defaults,
//! so a bare `[section]` header (or an absent one, under `#[serde(default)]`)
//! produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for an agentic runtime deployment, covering all four
/// subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Agentic Loop behaviour.
    pub agent_loop: LoopSection,
    /// Context-Window Manager budgets.
    pub window: WindowSection,
    /// Hybrid rate limiter parameters.
    pub rate_limit: RateLimitSection,
    /// Message batching pipeline parameters.
    pub batching: BatchingSection,
    /// Retry policy shared by the Responder and the batching dispatcher.
    pub retry: RetrySection,
}

impl RuntimeConfig {
    /// The default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loop section.
    #[must_use]
    pub fn with_agent_loop(mut self, section: LoopSection) -> Self {
        self.agent_loop = section;
        self
    }

    /// Replace the window section.
    #[must_use]
    pub fn with_window(mut self, section: WindowSection) -> Self {
        self.window = section;
        self
    }

    /// Replace the rate limit section.
    #[must_use]
    pub fn with_rate_limit(mut self, section: RateLimitSection) -> Self {
        self.rate_limit = section;
        self
    }

    /// Replace the batching section.
    #[must_use]
    pub fn with_batching(mut self, section: BatchingSection) -> Self {
        self.batching = section;
        self
    }

    /// Replace the retry section.
    #[must_use]
    pub fn with_retry(mut self, section: RetrySection) -> Self {
        self.retry = section;
        self
    }
}

/// Agentic Loop turn-budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSection {
    /// Maximum turns (LLM round-trips) before `TurnBudgetExceeded`.
    pub max_turns: u32,
}

impl Default for LoopSection {
    fn default() -> Self {
        Self { max_turns: 10 }
    }
}

/// Context-Window Manager budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    /// Token budget a `WindowStrategy` reduces history to fit under.
    pub max_tokens: usize,
    /// Whether the first developer message is always preserved.
    pub preserve_developer_messages: bool,
    /// Number of most-recent items `Summarization` keeps verbatim.
    pub keep_recent: usize,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            max_tokens: 8_000,
            preserve_developer_messages: true,
            keep_recent: 5,
        }
    }
}

/// Hybrid Token-Bucket + Sliding-Window rate limiter configuration
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Token bucket capacity `C`.
    pub token_capacity: u32,
    /// Token bucket refill rate, in tokens per minute.
    pub refill_per_minute: u32,
    /// Sliding window size `N`: at most this many messages per `window_secs`.
    pub window_max_messages: u32,
    /// Sliding window duration `W`, in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            token_capacity: 60,
            refill_per_minute: 60,
            window_max_messages: 60,
            window_secs: 60,
        }
    }
}

/// Message batching pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingSection {
    /// Per-user buffer capacity.
    pub buffer_capacity: usize,
    /// Silence timer, in milliseconds.
    pub silence_threshold_ms: u64,
    /// Maximum timer, in milliseconds.
    pub adaptive_timeout_ms: u64,
    /// One of `drop_new`, `drop_oldest`, `reject_with_notification`,
    /// `block_until_space`, `flush_and_accept`.
    pub backpressure: String,
    /// Bound on `block_until_space`'s wait, in milliseconds.
    pub block_timeout_ms: u64,
}

impl Default for BatchingSection {
    fn default() -> Self {
        Self {
            buffer_capacity: 50,
            silence_threshold_ms: 500,
            adaptive_timeout_ms: 5_000,
            backpressure: "drop_new".to_owned(),
            block_timeout_ms: 10_000,
        }
    }
}

/// Exponential backoff retry configuration, shared in spirit by the
/// Responder's `RetryPolicy` and the batching dispatcher's
/// `ErrorHandlingStrategy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Delay never exceeds this, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// HTTP status codes considered transient and thus retryable.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            retryable_statuses: vec![429, 500, 502, 503, 504, 529],
        }
    }
}
