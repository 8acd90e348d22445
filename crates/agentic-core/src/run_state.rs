//! Pause/resume state for a loop paused on `needsConfirmation`.

use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::tool::{ToolCall, ToolOutput};

/// One tool call already dispatched before a pause, kept as a plain,
/// serializable record so [`AgentRunState`] doesn't need to carry
/// `agentic-loop`'s richer execution type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExecutedToolCall {
    /// The call id this execution answers.
    pub call_id: String,
    /// Tool name invoked.
    pub tool_name: String,
    /// Whether the tool reported an error.
    pub is_error: bool,
    /// Wall-clock time spent inside the tool, in milliseconds.
    pub duration_ms: u64,
}

/// Token accounting carried across a pause, independent of `agentic-llm`'s
/// `Usage` type.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the input side of every call made before pausing.
    pub input_tokens: u64,
    /// Tokens consumed by the output side of every call made before pausing.
    pub output_tokens: u64,
}

/// A snapshot of an in-flight [`crate::ToolStore`]-driven loop, paused while
/// waiting on human approval for a tool call.
///
/// Grounded on `astrid_approval::request::ApprovalRequest` /
/// `ApprovalDecision`'s design: a plain, serializable value with no live
/// handles. There are no signatures and no
/// capability tokens — resuming this run state only needs the tool's output
/// (or a rejection), since this runtime's pause/resume contract has no
/// allowance/capability system to model. Tools and the Responder are
/// re-resolved by name from the caller's own registries on resume, never
/// carried inside the snapshot.
///
/// The response that produced `pending_call` may have requested further tool
/// calls after it; those are carried in `remaining_calls` rather than
/// discarded, so resuming re-enters dispatch of that same response instead
/// of starting a fresh turn. `executions_so_far`, `handoffs_so_far`, and
/// `usage_so_far` carry everything the run accumulated before the pause, so
/// a resumed run's final tally stays cumulative across the whole run rather
/// than restarting from the pause point.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentRunState {
    /// The conversation so far, including the assistant turn that requested
    /// the paused call.
    pub context: Context,
    /// The tool call awaiting a decision.
    pub pending_call: ToolCall,
    /// Tool calls from the same response as `pending_call`, still
    /// undispatched, in the order the response emitted them.
    pub remaining_calls: Vec<ToolCall>,
    /// Tool calls already dispatched in this run before the pause.
    pub executions_so_far: Vec<ExecutedToolCall>,
    /// Handoffs already taken in this run before the pause.
    pub handoffs_so_far: Vec<String>,
    /// Token accounting summed across this run before the pause.
    pub usage_so_far: TokenUsage,
    /// Turns consumed before pausing, for turn-budget accounting on resume.
    pub turns_used: u32,
    /// `true` once [`AgentRunState::resume`] has been called; resuming twice
    /// is a programmer error.
    #[serde(default)]
    resumed: bool,
}

impl AgentRunState {
    /// Capture a paused state for `pending_call`, carrying forward
    /// everything else the run had accumulated (undispatched sibling calls,
    /// executions, handoffs, and usage) up to the pause.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: Context,
        pending_call: ToolCall,
        remaining_calls: Vec<ToolCall>,
        executions_so_far: Vec<ExecutedToolCall>,
        handoffs_so_far: Vec<String>,
        usage_so_far: TokenUsage,
        turns_used: u32,
    ) -> Self {
        Self {
            context,
            pending_call,
            remaining_calls,
            executions_so_far,
            handoffs_so_far,
            usage_so_far,
            turns_used,
            resumed: false,
        }
    }

    /// Consume this run state with a human decision, producing the item to
    /// append to the context before resuming the loop.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyResumed`] if this state was already
    /// resumed once.
    pub fn resume(&mut self, decision: ApprovalDecision) -> CoreResult<ApprovalOutcome> {
        if self.resumed {
            return Err(CoreError::AlreadyResumed);
        }
        self.resumed = true;
        let call_id = self.pending_call.call_id.clone();
        let item = match decision {
            ApprovalDecision::Approved(output) => {
                crate::input::InputItem::ToolCallOutput {
                    call_id,
                    payload: output.clone().into_context_payload(),
                    is_error: output.is_error,
                }
            }
            ApprovalDecision::Rejected => {
                crate::input::InputItem::tool_error(call_id, "tool call rejected by operator")
            }
        };
        Ok(ApprovalOutcome {
            context_item: item,
            turns_used: self.turns_used,
        })
    }

    /// `true` once resumed.
    #[must_use]
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }
}

/// The human decision on a paused tool call.
#[derive(Debug, Clone)]
pub enum ApprovalDecision {
    /// Approve, supplying the tool's (possibly synthetic) output.
    Approved(ToolOutput),
    /// Reject; the loop continues with a tool-error item.
    Rejected,
}

/// What to do after resuming a paused run state.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    /// The item to append to the context before re-entering the loop.
    pub context_item: crate::input::InputItem,
    /// Turns consumed before the pause, to seed the resumed loop's counter.
    pub turns_used: u32,
}

/// Why an `AgenticLoop` invocation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalReason {
    /// The loop produced final assistant text with no further tool calls.
    Completed,
    /// An input or output guardrail rejected the interaction.
    GuardrailFailed,
    /// `maxTurns` was reached.
    TurnBudgetExceeded,
    /// A `needsConfirmation` tool call is awaiting a decision; the caller
    /// holds an [`AgentRunState`] to resume later.
    PausedForApproval,
    /// The assistant's final text failed structured-output parsing.
    OutputParseError,
    /// A `Handoff` tool call transferred control to another `Agent`.
    HandedOff {
        /// Name of the agent control was handed to.
        target_agent: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputItem;

    fn empty_state(pending_call: ToolCall, turns_used: u32) -> AgentRunState {
        AgentRunState::new(
            Context::new(),
            pending_call,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            TokenUsage::default(),
            turns_used,
        )
    }

    #[test]
    fn resume_twice_is_an_error() {
        let mut state = empty_state(ToolCall::new("c1", "delete_file", "{}"), 2);
        assert!(state.resume(ApprovalDecision::Rejected).is_ok());
        let err = state.resume(ApprovalDecision::Rejected).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResumed));
    }

    #[test]
    fn approved_resume_yields_tool_output_item() {
        let mut state = empty_state(ToolCall::new("c1", "delete_file", "{}"), 0);
        let outcome = state
            .resume(ApprovalDecision::Approved(ToolOutput::text("deleted")))
            .unwrap();
        match outcome.context_item {
            InputItem::ToolCallOutput { is_error, .. } => assert!(!is_error),
            InputItem::Message { .. } => panic!("expected ToolCallOutput"),
        }
    }

    #[test]
    fn rejected_resume_yields_error_item() {
        let mut state = empty_state(ToolCall::new("c1", "delete_file", "{}"), 0);
        let outcome = state.resume(ApprovalDecision::Rejected).unwrap();
        match outcome.context_item {
            InputItem::ToolCallOutput { is_error, .. } => assert!(is_error),
            InputItem::Message { .. } => panic!("expected ToolCallOutput"),
        }
    }

    #[test]
    fn carries_remaining_calls_and_accumulators_through_construction() {
        let state = AgentRunState::new(
            Context::new(),
            ToolCall::new("c1", "delete_file", "{}"),
            vec![ToolCall::new("c2", "echo", "{}")],
            vec![ExecutedToolCall {
                call_id: "c0".to_string(),
                tool_name: "lookup".to_string(),
                is_error: false,
                duration_ms: 12,
            }],
            vec!["billing".to_string()],
            TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
            3,
        );
        assert_eq!(state.remaining_calls.len(), 1);
        assert_eq!(state.executions_so_far.len(), 1);
        assert_eq!(state.handoffs_so_far, vec!["billing".to_string()]);
        assert_eq!(state.usage_so_far.input_tokens, 10);
    }
}
