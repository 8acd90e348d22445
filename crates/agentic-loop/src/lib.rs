//! The Agentic Loop: the turn-by-turn driver that alternates guardrails,
//! the LLM, tool/handoff dispatch, and approval pauses over an
//! [`agentic_core::Context`].
//!
//! An [`Agent`] bundles everything one participant in the loop needs
//! (instructions, tools, handoffs, guardrails, window strategy, Responder).
//! [`AgenticLoop`] drives one or more `Agent`s — switching on a
//! [`Handoff`] — until a [`agentic_core::TerminalReason`] holds.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod agent;
pub mod driver;
pub mod error;
pub mod guardrail;
pub mod handoff;
pub mod prelude;
pub mod tool_search;

pub use agent::Agent;
pub use driver::{AgenticLoop, LoopOutcome, RunResult, ToolExecution};
pub use error::{LoopError, LoopResult};
pub use guardrail::{Guardrail, GuardrailVerdict};
pub use handoff::Handoff;
pub use tool_search::{AllTools, ToolSearchStrategy};
