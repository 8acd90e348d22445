//! Convenience re-exports for downstream crates.

pub use crate::error::{ConfigError, ConfigResult};
pub use crate::types::{
    BatchingSection, LoopSection, RateLimitSection, RetrySection, RuntimeConfig, WindowSection,
};
pub use crate::validate::validate;
