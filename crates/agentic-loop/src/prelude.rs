//! Convenience re-exports for crates consuming `agentic-loop`.

pub use crate::agent::Agent;
pub use crate::driver::{AgenticLoop, LoopOutcome, RunResult, ToolExecution};
pub use crate::error::{LoopError, LoopResult};
pub use crate::guardrail::{Guardrail, GuardrailVerdict};
pub use crate::handoff::Handoff;
pub use crate::tool_search::{AllTools, ToolSearchStrategy};
