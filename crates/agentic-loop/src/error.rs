//! Errors surfaced by [`crate::AgenticLoop`].

use agentic_core::AgentError;
use thiserror::Error;

/// Failures that abort a loop run outright, as opposed to
/// [`AgentError`]'s taxonomy of terminal-but-expected stopping conditions
/// (those are carried in [`crate::RunResult::terminal_reason`] /
/// returned via [`crate::LoopOutcome::Paused`], never as an `Err`).
///
/// This crate reserves `Err` for the one case calls out as
/// "surface to caller, after retries exhausted": a Responder failure the
/// `RetryPolicy` gave up on.
#[derive(Debug, Error)]
pub enum LoopError {
    /// The Responder failed every retry attempt.
    #[error(transparent)]
    Responder(#[from] AgentError),
}

/// Result alias for [`crate::AgenticLoop::run`].
pub type LoopResult<T> = Result<T, LoopError>;
