//! Core data model for the agentic runtime.
//!
//! Defines the conversation [`Context`], the [`Tool`]/[`ToolStore`] contract,
//! the pause/resume [`AgentRunState`] snapshot, and the error taxonomy shared
//! by every other crate in the workspace.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod context;
pub mod error;
pub mod input;
pub mod prelude;
pub mod retry;
pub mod run_state;
pub mod tool;
pub mod tool_store;

pub use context::Context;
pub use error::{
    AgentError, CoreError, CoreResult, GuardrailPhase, PlanValidationKind, RetryableClass,
};
pub use input::{ContentPart, ImageDetail, ImageSource, InputItem, MessageRole, ToolCallOutputPayload};
pub use retry::RetryPolicy;
pub use run_state::{
    AgentRunState, ApprovalDecision, ApprovalOutcome, ExecutedToolCall, TerminalReason, TokenUsage,
};
pub use tool::{Tool, ToolCall, ToolOutput, ToolOutputPayload};
pub use tool_store::{ToolSchema, ToolStore};
