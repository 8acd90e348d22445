//! Convenience re-exports for downstream crates.

pub use crate::backpressure::BackpressureStrategy;
pub use crate::batching_service::{
    BatchMeta, BatchingConfig, BatchingService, DispatchReason, Processor, ReceiveOutcome,
};
pub use crate::dedupe::DedupeStore;
pub use crate::error::{BatchingError, BatchingResult};
pub use crate::error_handling::{ErrorHandlingStrategy, LoggingTerminalHandler, TerminalHandler};
pub use crate::message::Message;
pub use crate::rate_limiter::{HybridRateLimiter, RateLimiterConfig};
pub use crate::user_buffer::UserBuffer;
