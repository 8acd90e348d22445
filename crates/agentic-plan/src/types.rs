//! The `ToolPlan` data model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The name of the tool that accepts a [`ToolPlan`], reserved so a step may
/// not recursively invoke the plan tool itself.
pub const EXECUTE_TOOL_PLAN: &str = "execute_tool_plan";

/// One node of a [`ToolPlan`]'s DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPlanStep {
    /// Non-empty, charset `[A-Za-z0-9_]`, unique within the owning plan.
    pub id: String,
    /// The tool to invoke; must exist in the outer `ToolStore` and must not
    /// be [`EXECUTE_TOOL_PLAN`].
    pub tool_name: String,
    /// Opaque raw arguments JSON, which may contain `$ref:stepId[.path]`
    /// tokens resolved before invocation.
    pub arguments_json: String,
}

impl ToolPlanStep {
    /// Construct a step.
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments_json: arguments_json.into(),
        }
    }
}

/// A declarative DAG of tool invocations, submitted by the LLM in one call
/// to [`EXECUTE_TOOL_PLAN`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPlan {
    /// The plan's steps, in no particular dependency order.
    pub steps: Vec<ToolPlanStep>,
    /// If set, only these step ids' results are included in
    /// [`PlanResult::output_results`]; otherwise all steps are included.
    pub output_steps: Option<Vec<String>>,
}

impl ToolPlan {
    /// Construct a plan with no output filter.
    #[must_use]
    pub fn new(steps: Vec<ToolPlanStep>) -> Self {
        Self {
            steps,
            output_steps: None,
        }
    }

    /// Restrict [`PlanResult::output_results`] to the given step ids.
    #[must_use]
    pub fn with_output_steps(mut self, output_steps: Vec<String>) -> Self {
        self.output_steps = Some(output_steps);
        self
    }
}

/// The outcome of one step's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The step's id.
    pub id: String,
    /// `true` if the step's tool invocation succeeded.
    pub success: bool,
    /// The tool's output text (or a skip/failure message), present even on
    /// failure for operator visibility.
    pub output: String,
    /// Wall-clock duration of this step's execution.
    pub duration: Duration,
}

/// The full result of executing a [`ToolPlan`].
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Every step's result, in the order waves completed.
    pub step_results: Vec<StepResult>,
    /// `step_results` filtered by `outputSteps`, or all of them if the plan
    /// set no filter.
    pub output_results: Vec<StepResult>,
    /// Failed steps' ids mapped to their error message, including steps
    /// skipped because a dependency failed.
    pub errors: std::collections::HashMap<String, String>,
    /// Total wall-clock duration across all waves.
    pub total_duration: Duration,
}

impl PlanResult {
    /// `true` if any step failed or was skipped.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// A compact human-readable summary suitable to feed back into the LLM
    /// as the `execute_tool_plan` tool's output.
    #[must_use]
    pub fn summarize(&self) -> String {
        let mut lines = Vec::with_capacity(self.step_results.len() + 1);
        for result in &self.step_results {
            let status = if result.success { "ok" } else { "failed" };
            lines.push(format!(
                "{} [{status}, {}ms]: {}",
                result.id,
                result.duration.as_millis(),
                result.output
            ));
        }
        if self.has_errors() {
            lines.push(format!("{} step(s) failed", self.errors.len()));
        }
        lines.join("\n")
    }
}
