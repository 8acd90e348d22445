//! Declarative agent-to-agent transfer.

use std::sync::Arc;

use crate::agent::Agent;

/// One agent this [`Agent`] may transfer the conversation to, driven by the
/// LLM emitting a `HandoffCall` naming [`Handoff::target_name`].
///
/// A permanent transfer: unlike a sub-agent tool, control does not return
/// to the delegating agent once a handoff is taken.
#[derive(Clone)]
pub struct Handoff {
    target_name: String,
    description: String,
    target: Arc<Agent>,
}

impl Handoff {
    /// Declare a handoff target. `description` is folded into the system
    /// prompt's handoff directives so the LLM knows when to use it.
    #[must_use]
    pub fn new(target_name: impl Into<String>, description: impl Into<String>, target: Arc<Agent>) -> Self {
        Self {
            target_name: target_name.into(),
            description: description.into(),
            target,
        }
    }

    /// The name the LLM must emit in a `HandoffCall::target_agent` to
    /// select this handoff.
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Human-readable rationale shown to the LLM in the system prompt.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The agent control transfers to.
    #[must_use]
    pub fn target(&self) -> Arc<Agent> {
        Arc::clone(&self.target)
    }
}
