//! Typed, validated configuration schema for the agentic runtime's four
//! subsystems.
//!
//! This crate only defines [`RuntimeConfig`] and validates it; loading it
//! from layered files, environment variables, or a CLI is an embedding
//! application's concern, the same split `astrid_config` draws between its
//! `types`/`validate` modules and its `loader`/`merge` modules.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod prelude;
pub mod types;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    BatchingSection, LoopSection, RateLimitSection, RetrySection, RuntimeConfig, WindowSection,
};
pub use validate::validate;

impl RuntimeConfig {
    /// Parse a [`RuntimeConfig`] from a TOML document. Missing sections and
    /// fields fall back to their defaults via `#[serde(default)]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `source` is not valid TOML or does
    /// not match the schema.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config.agent_loop.max_turns, 10);
        assert_eq!(config.batching.buffer_capacity, 50);
    }

    #[test]
    fn partial_section_only_overrides_named_fields() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [agent_loop]
            max_turns = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.agent_loop.max_turns, 25);
        assert_eq!(config.window.max_tokens, 8_000);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = RuntimeConfig::from_toml_str("this is not [ toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
