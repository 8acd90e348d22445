//! Per-user message batching: hybrid rate limiting, adaptive flush
//! scheduling, backpressure, and retry.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backpressure;
pub mod batching_service;
pub mod dedupe;
pub mod error;
pub mod error_handling;
pub mod message;
pub mod prelude;
pub mod rate_limiter;
pub mod user_buffer;

pub use backpressure::BackpressureStrategy;
pub use batching_service::{
    BatchMeta, BatchingConfig, BatchingService, DispatchReason, Processor, ReceiveOutcome,
};
pub use dedupe::DedupeStore;
pub use error::{BatchingError, BatchingResult};
pub use error_handling::{ErrorHandlingStrategy, LoggingTerminalHandler, TerminalHandler};
pub use message::Message;
pub use rate_limiter::{HybridRateLimiter, RateLimiterConfig};
pub use user_buffer::UserBuffer;
