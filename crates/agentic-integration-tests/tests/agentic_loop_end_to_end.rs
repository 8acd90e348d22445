//! A full turn of [`AgenticLoop`] driving an [`Agent`] whose tool surface
//! includes [`PlanTool`], so one LLM tool call fans out into a whole
//! `ToolPlanExecutor` run before the loop completes. No single crate's own
//! tests exercise this combination.

use std::sync::Arc;

use agentic_core::{Context, InputItem, Tool, ToolOutput, ToolStore, TerminalReason};
use agentic_llm::{text_response, tool_call_response, TestResponder};
use agentic_loop::{Agent, AgenticLoop, LoopOutcome};
use agentic_plan::PlanTool;
use agentic_window::{HeuristicTokenCounter, SlidingWindow};
use async_trait::async_trait;
use serde_json::Value;

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
    async fn invoke(&self, input: Value) -> ToolOutput {
        ToolOutput::text(
            input
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        )
    }
}

struct Concat;

#[async_trait]
impl Tool for Concat {
    fn name(&self) -> &str {
        "concat"
    }
    fn description(&self) -> &str {
        "concatenates {a} and {b}"
    }
    fn schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
    async fn invoke(&self, input: Value) -> ToolOutput {
        let a = input.get("a").and_then(Value::as_str).unwrap_or_default();
        let b = input.get("b").and_then(Value::as_str).unwrap_or_default();
        ToolOutput::text(format!("{a} + {b}"))
    }
}

#[tokio::test]
async fn plan_tool_call_runs_a_whole_dag_within_one_turn() {
    let mut backing_store = ToolStore::new();
    backing_store.register(Arc::new(Echo)).unwrap();
    backing_store.register(Arc::new(Concat)).unwrap();

    let plan_args = serde_json::json!({
        "steps": [
            {"id": "s1", "tool": "echo", "arguments": "{\"message\":\"hello\"}"},
            {"id": "s2", "tool": "concat", "arguments": "{\"a\":\"$ref:s1\",\"b\":\"world\"}"}
        ]
    })
    .to_string();

    let agent = Agent::new(
        "planner",
        "you can submit whole tool plans",
        Arc::new(
            TestResponder::new()
                .with_response(tool_call_response("c1", "execute_tool_plan", &plan_args))
                .with_response(text_response("plan complete")),
        ),
        Arc::new(SlidingWindow::new()),
        Arc::new(HeuristicTokenCounter),
    )
    .with_tool(Arc::new(PlanTool::new(backing_store)));

    let mut context = Context::new();
    context.push(InputItem::user("run the plan"));

    let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();

    match outcome {
        LoopOutcome::Finished(result) => {
            assert_eq!(result.terminal_reason, TerminalReason::Completed);
            assert_eq!(result.executions.len(), 1);
            assert!(!result.executions[0].is_error);
            assert_eq!(result.final_text.as_deref(), Some("plan complete"));
        }
        LoopOutcome::Paused { .. } => panic!("expected finished"),
    }
}
