//! The error taxonomy shared across the agentic runtime.
//!
//! Every terminal or surfaced failure is a tagged variant here rather than a
//! raw string, so callers can match on `kind` instead of parsing messages.

use thiserror::Error;

/// Errors surfaced by the core data model (tool registration, context
/// bookkeeping). Subsystem crates (`agentic-loop`, `agentic-plan`, ...)
/// define their own error enums that wrap or sit alongside this one rather
/// than funnel everything through a single god-enum.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two tools in the same [`crate::ToolStore`] were registered with the
    /// same name.
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A tool name did not resolve against the store's registered tools.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A paused [`crate::AgentRunState`] was resumed a second time.
    #[error("run state already resumed")]
    AlreadyResumed,
}

/// Result alias for [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// The terminal error taxonomy, shared by `agentic-loop`
/// and `agentic-plan` so that callers see one vocabulary for "why did the
/// interaction stop" regardless of which subsystem raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// An input or output guardrail rejected the interaction. Terminal; the
    /// `Context` is unchanged beyond any user input already appended.
    #[error("guardrail failed in {phase} phase: {reason}")]
    GuardrailFailed {
        /// Which phase rejected the content.
        phase: GuardrailPhase,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// `maxTurns` was reached before a terminal condition. Terminal; the
    /// caller receives whatever partial text exists.
    #[error("turn budget of {turns_used} turns exceeded")]
    TurnBudgetExceeded {
        /// Turns consumed before the budget was hit.
        turns_used: u32,
    },

    /// The Responder failed after the `RetryPolicy` was exhausted.
    #[error("responder error ({retryable_class:?}, status={status_code:?}): {cause}")]
    ResponderError {
        /// Whether this class of error is retryable at all.
        retryable_class: RetryableClass,
        /// HTTP-style status code, if the transport exposed one.
        status_code: Option<u16>,
        /// Underlying cause, as text (the transport error type is external).
        cause: String,
    },

    /// The final assistant text failed to parse against the configured
    /// structured-output schema. Terminal.
    #[error("failed to parse structured output: {cause}")]
    OutputParseError {
        /// Parser failure detail.
        cause: String,
    },

    /// A `ToolPlan` failed validation before any step executed. Terminal
    /// for the plan tool call only — the outer loop continues.
    #[error("plan validation failed ({kind:?}{step_id:?})")]
    PlanValidationError {
        /// Kind of validation failure.
        kind: PlanValidationKind,
        /// The offending step id, if attributable to one step.
        step_id: Option<String>,
    },
}

/// Which guardrail phase rejected the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardrailPhase {
    /// Ran against the initial user input, before any LLM call.
    Input,
    /// Ran against the final assistant text, after the loop would otherwise
    /// terminate successfully.
    Output,
}

impl std::fmt::Display for GuardrailPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Classification used by [`crate::RetryPolicy`] to decide whether a
/// Responder error is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableClass {
    /// Transient: network failure or a retryable HTTP status.
    Transient,
    /// Permanent: retrying would not help (e.g. 400, 401).
    Permanent,
}

/// The specific way a `ToolPlan` failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanValidationKind {
    /// Two steps declared the same id.
    DuplicateId,
    /// A step named a tool absent from the outer `ToolStore`.
    UnknownTool,
    /// The step dependency graph contains a cycle.
    Cycle,
    /// A step attempted to invoke the plan tool itself.
    RecursivePlan,
    /// A `$ref` token could not be resolved.
    UnresolvedRef,
}
