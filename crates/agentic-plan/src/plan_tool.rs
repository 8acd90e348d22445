//! [`PlanTool`]: adapts [`crate::ToolPlanExecutor`] to the `agentic_core::Tool`
//! contract, so the LLM can submit a whole DAG through one ordinary tool
//! call.

use std::sync::Arc;
use std::time::Duration;

use agentic_core::{Tool, ToolOutput, ToolStore};
use agentic_telemetry::TelemetryBus;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::executor::ToolPlanExecutor;
use crate::types::{ToolPlan, ToolPlanStep, EXECUTE_TOOL_PLAN};

/// The JSON schema advertised for [`EXECUTE_TOOL_PLAN`]:
/// `arguments` is an opaque JSON string rather than a nested object, both to
/// avoid schema blow-up across arbitrarily different tool parameter shapes
/// and to let `$ref` tokens sit in string positions without fighting a
/// nested schema's type constraints.
#[must_use]
pub fn execute_tool_plan_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "tool": { "type": "string" },
                        "arguments": { "type": "string" }
                    },
                    "required": ["id", "tool", "arguments"]
                }
            },
            "output_steps": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["steps"]
    })
}

#[derive(Debug, Deserialize)]
struct RawStep {
    id: String,
    tool: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    steps: Vec<RawStep>,
    #[serde(default)]
    output_steps: Option<Vec<String>>,
}

/// A tool that runs an LLM-submitted [`ToolPlan`] against a snapshot of the
/// outer agent's [`ToolStore`].
///
/// Grounded on `astrid_mcp::capabilities`'s pattern of wrapping a whole
/// subsystem behind one `BuiltinTool`-shaped facade; here the facade hides
/// validation, wave scheduling, and fail-forward execution behind a single
/// `invoke`. Holds a cloned [`ToolStore`] captured before this tool itself
/// is registered, so a plan step can never (even accidentally) resolve back
/// to this tool — recursion is additionally forbidden by name in
/// [`ToolPlanExecutor::validate`].
pub struct PlanTool {
    tools: ToolStore,
    deadline: Option<Duration>,
    telemetry: Option<Arc<TelemetryBus>>,
}

impl PlanTool {
    /// Wrap the given tool store. Pass a snapshot taken *before* registering
    /// this `PlanTool` into the store the agent actually uses.
    #[must_use]
    pub fn new(tools: ToolStore) -> Self {
        Self {
            tools,
            deadline: None,
            telemetry: None,
        }
    }

    /// Bound total plan execution.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Publish a [`agentic_telemetry::TelemetryEvent`] for the plan and each
    /// of its steps on `bus`.
    #[must_use]
    pub fn with_telemetry(mut self, bus: Arc<TelemetryBus>) -> Self {
        self.telemetry = Some(bus);
        self
    }
}

#[async_trait]
impl Tool for PlanTool {
    fn name(&self) -> &str {
        EXECUTE_TOOL_PLAN
    }

    fn description(&self) -> &str {
        "Execute a declarative DAG of tool invocations server-side, with \
         cross-step $ref:stepId[.field.path] references and maximal \
         parallelism across independent steps."
    }

    fn schema(&self) -> Value {
        execute_tool_plan_schema()
    }

    fn strict(&self) -> bool {
        true
    }

    async fn invoke(&self, input: Value) -> ToolOutput {
        let raw: RawPlan = match serde_json::from_value(input) {
            Ok(raw) => raw,
            Err(error) => return ToolOutput::error(format!("invalid plan arguments: {error}")),
        };

        let plan = ToolPlan {
            steps: raw
                .steps
                .into_iter()
                .map(|s| ToolPlanStep::new(s.id, s.tool, s.arguments))
                .collect(),
            output_steps: raw.output_steps,
        };

        let mut executor = ToolPlanExecutor::new(&self.tools);
        if let Some(bus) = &self.telemetry {
            executor = executor.with_telemetry(Arc::clone(bus));
        }
        match executor.execute(&plan, self.deadline).await {
            Ok(result) => ToolOutput::text(result.summarize()),
            Err(error) => ToolOutput::error(format!("plan validation failed: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agentic_core::ToolOutput as CoreToolOutput;

    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes {message}"
        }
        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn invoke(&self, input: Value) -> CoreToolOutput {
            CoreToolOutput::text(
                input
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            )
        }
    }

    fn store() -> ToolStore {
        let mut store = ToolStore::new();
        store.register(Arc::new(Echo)).unwrap();
        store
    }

    #[tokio::test]
    async fn invoke_runs_a_valid_plan() {
        let tool = PlanTool::new(store());
        let input = serde_json::json!({
            "steps": [
                {"id": "s1", "tool": "echo", "arguments": r#"{"message":"hi"}"#}
            ]
        });
        let output = tool.invoke(input).await;
        assert!(!output.is_error);
        assert!(output.content.as_text().contains("hi"));
    }

    #[tokio::test]
    async fn invoke_surfaces_validation_errors() {
        let tool = PlanTool::new(store());
        let input = serde_json::json!({
            "steps": [
                {"id": "s1", "tool": "does_not_exist", "arguments": "{}"}
            ]
        });
        let output = tool.invoke(input).await;
        assert!(output.is_error);
        assert!(output.content.as_text().contains("plan validation failed"));
    }

    #[tokio::test]
    async fn invoke_rejects_malformed_arguments() {
        let tool = PlanTool::new(store());
        let output = tool.invoke(serde_json::json!({"not_steps": true})).await;
        assert!(output.is_error);
    }

    #[test]
    fn schema_requires_steps_and_opaque_arguments_string() {
        let schema = execute_tool_plan_schema();
        assert_eq!(schema["required"], serde_json::json!(["steps"]));
        assert_eq!(
            schema["properties"]["steps"]["items"]["properties"]["arguments"]["type"],
            serde_json::json!("string")
        );
    }
}
