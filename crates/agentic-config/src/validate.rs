//! Cross-field configuration validation.
//!
//! Grounded on `astrid_config::validate`'s per-section check functions, with
//! one deliberate change: that function's doc comment promises "a list of
//! all validation errors encountered"; `validate` here actually does
//! collect every problem into one `Vec` instead of stopping at the first.

use crate::error::ConfigError;
use crate::types::RuntimeConfig;

/// Validate a fully-deserialized [`RuntimeConfig`].
///
/// Returns an empty `Vec` if every section is valid, otherwise every
/// validation error found across all sections.
#[must_use]
pub fn validate(config: &RuntimeConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    validate_loop(config, &mut errors);
    validate_window(config, &mut errors);
    validate_rate_limit(config, &mut errors);
    validate_batching(config, &mut errors);
    validate_retry(config, &mut errors);
    errors
}

fn invalid(errors: &mut Vec<ConfigError>, field: &str, message: impl Into<String>) {
    errors.push(ConfigError::Invalid {
        field: field.to_owned(),
        message: message.into(),
    });
}

fn validate_loop(config: &RuntimeConfig, errors: &mut Vec<ConfigError>) {
    if config.agent_loop.max_turns == 0 {
        invalid(errors, "agent_loop.max_turns", "must be greater than 0");
    }
}

fn validate_window(config: &RuntimeConfig, errors: &mut Vec<ConfigError>) {
    let w = &config.window;
    if w.max_tokens == 0 {
        invalid(errors, "window.max_tokens", "must be greater than 0");
    }
    if w.keep_recent == 0 {
        invalid(
            errors,
            "window.keep_recent",
            "must be greater than 0 (Summarization always keeps at least one recent item)",
        );
    }
}

fn validate_rate_limit(config: &RuntimeConfig, errors: &mut Vec<ConfigError>) {
    let r = &config.rate_limit;
    if r.token_capacity == 0 {
        invalid(
            errors,
            "rate_limit.token_capacity",
            "must be greater than 0",
        );
    }
    if r.window_max_messages == 0 {
        invalid(
            errors,
            "rate_limit.window_max_messages",
            "must be greater than 0",
        );
    }
    if r.window_secs == 0 {
        invalid(errors, "rate_limit.window_secs", "must be greater than 0");
    }
}

const VALID_BACKPRESSURE_STRATEGIES: [&str; 5] = [
    "drop_new",
    "drop_oldest",
    "reject_with_notification",
    "block_until_space",
    "flush_and_accept",
];

fn validate_batching(config: &RuntimeConfig, errors: &mut Vec<ConfigError>) {
    let b = &config.batching;
    if b.buffer_capacity == 0 {
        invalid(
            errors,
            "batching.buffer_capacity",
            "must be greater than 0",
        );
    }
    if b.silence_threshold_ms == 0 {
        invalid(
            errors,
            "batching.silence_threshold_ms",
            "must be greater than 0",
        );
    }
    if b.adaptive_timeout_ms < b.silence_threshold_ms {
        invalid(
            errors,
            "batching.adaptive_timeout_ms",
            format!(
                "must be at least silence_threshold_ms ({}); otherwise the max timer could \
                 never fire after the silence timer",
                b.silence_threshold_ms
            ),
        );
    }
    if !VALID_BACKPRESSURE_STRATEGIES.contains(&b.backpressure.as_str()) {
        invalid(
            errors,
            "batching.backpressure",
            format!(
                "unsupported strategy '{}'; expected one of: {}",
                b.backpressure,
                VALID_BACKPRESSURE_STRATEGIES.join(", ")
            ),
        );
    }
    if b.backpressure == "block_until_space" && b.block_timeout_ms == 0 {
        invalid(
            errors,
            "batching.block_timeout_ms",
            "must be greater than 0 when backpressure is block_until_space",
        );
    }
}

fn validate_retry(config: &RuntimeConfig, errors: &mut Vec<ConfigError>) {
    let r = &config.retry;
    if r.max_attempts == 0 {
        invalid(errors, "retry.max_attempts", "must be greater than 0");
    }
    if !r.multiplier.is_finite() || r.multiplier < 1.0 {
        invalid(
            errors,
            "retry.multiplier",
            "must be a finite number >= 1.0",
        );
    }
    if r.max_delay_ms < r.initial_delay_ms {
        invalid(
            errors,
            "retry.max_delay_ms",
            format!(
                "must be at least initial_delay_ms ({})",
                r.initial_delay_ms
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&RuntimeConfig::default()).is_empty());
    }

    #[test]
    fn accumulates_every_error_in_one_pass() {
        let mut config = RuntimeConfig::default();
        config.agent_loop.max_turns = 0;
        config.window.max_tokens = 0;
        config.retry.max_attempts = 0;

        let errors = validate(&config);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_unsupported_backpressure_strategy() {
        let mut config = RuntimeConfig::default();
        config.batching.backpressure = "yolo".to_owned();
        let errors = validate(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ConfigError::Invalid { field, .. } if field == "batching.backpressure"));
    }

    #[test]
    fn block_until_space_requires_a_positive_block_timeout() {
        let mut config = RuntimeConfig::default();
        config.batching.backpressure = "block_until_space".to_owned();
        config.batching.block_timeout_ms = 0;
        let errors = validate(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Invalid { field, .. } if field == "batching.block_timeout_ms")));
    }

    #[test]
    fn adaptive_timeout_below_silence_threshold_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.batching.silence_threshold_ms = 1_000;
        config.batching.adaptive_timeout_ms = 500;
        let errors = validate(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Invalid { field, .. } if field == "batching.adaptive_timeout_ms")));
    }

    #[test]
    fn retry_max_delay_below_initial_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.retry.initial_delay_ms = 5_000;
        config.retry.max_delay_ms = 1_000;
        let errors = validate(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Invalid { field, .. } if field == "retry.max_delay_ms")));
    }

    #[test]
    fn retry_multiplier_below_one_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.retry.multiplier = 0.5;
        let errors = validate(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Invalid { field, .. } if field == "retry.multiplier")));
    }
}
