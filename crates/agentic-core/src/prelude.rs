//! Convenience re-exports for crates consuming `agentic-core`.
//!
//! Mirrors the per-crate `prelude` convention used elsewhere in this
//! workspace (`astrid_llm::prelude`, `astrid_approval::prelude`, ...).

pub use crate::context::Context;
pub use crate::error::{AgentError, CoreError, CoreResult, GuardrailPhase, RetryableClass};
pub use crate::input::{ContentPart, ImageDetail, ImageSource, InputItem, MessageRole, ToolCallOutputPayload};
pub use crate::retry::RetryPolicy;
pub use crate::run_state::{
    AgentRunState, ApprovalDecision, ApprovalOutcome, ExecutedToolCall, TerminalReason, TokenUsage,
};
pub use crate::tool::{Tool, ToolCall, ToolOutput, ToolOutputPayload};
pub use crate::tool_store::{ToolSchema, ToolStore};
