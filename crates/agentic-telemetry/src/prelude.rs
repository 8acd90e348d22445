//! Convenience re-exports for downstream crates.

pub use crate::bus::{TelemetryBus, TelemetryProcessor, TelemetryReceiver, TelemetryWorkerHandle};
pub use crate::context::{RequestContext, RequestGuard};
pub use crate::error::{TelemetryError, TelemetryResult};
pub use crate::event::{SpanIds, TelemetryEvent};
pub use crate::ids::{generate_span_id, generate_trace_id};
pub use crate::logging::{setup_default_logging, setup_logging, LogConfig, LogFormat, LogTarget};
