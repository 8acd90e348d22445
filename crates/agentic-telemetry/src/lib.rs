//! Trace/span id generation, a bounded-queue event bus, and logging setup
//! for the agentic runtime.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod bus;
pub mod context;
pub mod error;
pub mod event;
pub mod ids;
pub mod logging;
pub mod prelude;

pub use bus::{TelemetryBus, TelemetryProcessor, TelemetryReceiver, TelemetryWorkerHandle};
pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use event::{SpanIds, TelemetryEvent};
pub use ids::{generate_span_id, generate_trace_id};
pub use logging::{setup_default_logging, setup_logging, LogConfig, LogFormat, LogTarget};
