//! Plan validation failures.

use agentic_core::PlanValidationKind;
use thiserror::Error;

/// Failure to validate or execute a [`crate::ToolPlan`]. Terminal for the
/// plan tool call only; the outer loop continues. Wraps
/// `agentic_core::PlanValidationKind` so callers see the shared taxonomy
/// rather than a plan-specific duplicate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("plan validation failed ({kind:?}{})", step_id.as_deref().map(|s| format!(": {s}")).unwrap_or_default())]
pub struct PlanError {
    /// The kind of validation failure.
    pub kind: PlanValidationKind,
    /// The offending step id, if attributable to one step.
    pub step_id: Option<String>,
}

impl PlanError {
    /// Construct a plan error with no specific offending step.
    #[must_use]
    pub fn new(kind: PlanValidationKind) -> Self {
        Self { kind, step_id: None }
    }

    /// Construct a plan error attributed to one step.
    #[must_use]
    pub fn for_step(kind: PlanValidationKind, step_id: impl Into<String>) -> Self {
        Self {
            kind,
            step_id: Some(step_id.into()),
        }
    }
}

/// Result alias for plan validation.
pub type ValidationResult<T> = Result<T, PlanError>;
