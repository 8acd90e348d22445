//! Unified prelude for the agentic runtime.
//!
//! This crate provides a single import to bring in the commonly used types
//! from across the workspace. Use it when you need types from multiple
//! crates without managing individual imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use agentic_prelude::*;
//!
//! // Now you have access to types from:
//! // - agentic-core     (Context, Tool/ToolStore, AgentRunState, errors)
//! // - agentic-llm      (Responder, LlmRequest/LlmResponse, TestResponder)
//! // - agentic-window   (TokenCounter, SlidingWindow, Summarization)
//! // - agentic-plan     (ToolPlanExecutor, PlanReferenceResolver)
//! // - agentic-loop     (AgenticLoop, Agent, Handoff, Guardrail)
//! // - agentic-telemetry (TelemetryBus, trace/span ids, logging setup)
//! // - agentic-batching (BatchingService, HybridRateLimiter, UserBuffer)
//! // - agentic-config   (RuntimeConfig)
//! ```
//!
//! # Per-Crate Preludes
//!
//! If you only need types from one crate, use its own prelude:
//!
//! ```rust,ignore
//! use agentic_core::prelude::*;
//! use agentic_loop::prelude::*;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub use agentic_batching::prelude::*;
pub use agentic_config::prelude::*;
pub use agentic_core::prelude::*;
pub use agentic_llm::prelude::*;
pub use agentic_loop::prelude::*;
pub use agentic_plan::prelude::*;
pub use agentic_telemetry::prelude::*;
pub use agentic_window::prelude::*;
