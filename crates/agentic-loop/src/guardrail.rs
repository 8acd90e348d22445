//! The [`Guardrail`] contract.

use agentic_core::{Context, GuardrailPhase};
use async_trait::async_trait;

/// Validates content before (`Input`) or after (`Output`) the loop body
/// runs, and may reject the interaction with a reason.
///
/// Grounded on `astrid_hooks::hook::HookResult`'s `Continue`/`Block{reason}`
/// split — the same "either let it through or name why not" shape, without
/// the hooks crate's richer `ContinueWith { modifications }` variant, since
/// this runtime's guardrails only gate, they never rewrite content.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Name shown in telemetry and `GuardrailFailed` error messages.
    fn name(&self) -> &str;

    /// Validate `text` (the latest user input for `Input`, the final
    /// assistant text for `Output`) against the conversation so far.
    async fn check(&self, phase: GuardrailPhase, text: &str, context: &Context) -> GuardrailVerdict;
}

/// The outcome of a single [`Guardrail::check`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailVerdict {
    /// The content is acceptable.
    Pass,
    /// The content is rejected, with a human-readable reason.
    Fail(String),
}

impl GuardrailVerdict {
    /// `true` for [`GuardrailVerdict::Pass`].
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysPass;

    #[async_trait]
    impl Guardrail for AlwaysPass {
        fn name(&self) -> &str {
            "always_pass"
        }
        async fn check(&self, _phase: GuardrailPhase, _text: &str, _context: &Context) -> GuardrailVerdict {
            GuardrailVerdict::Pass
        }
    }

    struct RejectsEmpty;

    #[async_trait]
    impl Guardrail for RejectsEmpty {
        fn name(&self) -> &str {
            "rejects_empty"
        }
        async fn check(&self, _phase: GuardrailPhase, text: &str, _context: &Context) -> GuardrailVerdict {
            if text.trim().is_empty() {
                GuardrailVerdict::Fail("input must not be empty".to_string())
            } else {
                GuardrailVerdict::Pass
            }
        }
    }

    #[tokio::test]
    async fn always_pass_passes() {
        let guardrail = AlwaysPass;
        let verdict = guardrail.check(GuardrailPhase::Input, "hi", &Context::new()).await;
        assert!(verdict.is_pass());
    }

    #[tokio::test]
    async fn rejects_empty_fails_on_blank_text() {
        let guardrail = RejectsEmpty;
        let verdict = guardrail.check(GuardrailPhase::Input, "   ", &Context::new()).await;
        assert!(!verdict.is_pass());
    }
}
