//! End-to-end `ToolPlanExecutor` scenarios wired against real `Tool` impls,
//! not just the unit-level fixtures already covered inside `agentic-plan`.

use std::sync::Arc;

use agentic_core::{PlanValidationKind, Tool, ToolOutput, ToolStore};
use agentic_plan::{PlanError, ToolPlan, ToolPlanExecutor, ToolPlanStep};
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

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing_tool"
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
    async fn invoke(&self, _input: Value) -> ToolOutput {
        ToolOutput::error("boom")
    }
}

fn store() -> ToolStore {
    let mut store = ToolStore::new();
    store.register(Arc::new(Echo)).unwrap();
    store.register(Arc::new(Concat)).unwrap();
    store.register(Arc::new(FailingTool)).unwrap();
    store
}

#[tokio::test]
async fn s1_tool_chain_resolves_a_reference_into_the_next_step() {
    let tools = store();
    let plan = ToolPlan::new(vec![
        ToolPlanStep::new("s1", "echo", r#"{"message":"hello"}"#),
        ToolPlanStep::new("s2", "concat", r#"{"a":"$ref:s1","b":"world"}"#),
    ]);

    let result = ToolPlanExecutor::new(&tools).execute(&plan, None).await.unwrap();

    assert!(!result.has_errors());
    let s2 = result.step_results.iter().find(|r| r.id == "s2").unwrap();
    assert_eq!(s2.output, "hello + world");
}

#[tokio::test]
async fn s2_diamond_runs_independent_steps_before_their_joiner() {
    let tools = store();
    let plan = ToolPlan::new(vec![
        ToolPlanStep::new("a", "echo", r#"{"message":"alpha"}"#),
        ToolPlanStep::new("b", "echo", r#"{"message":"beta"}"#),
        ToolPlanStep::new("c", "concat", r#"{"a":"$ref:a","b":"$ref:b"}"#),
    ])
    .with_output_steps(vec!["c".to_string()]);

    let result = ToolPlanExecutor::new(&tools).execute(&plan, None).await.unwrap();

    assert!(!result.has_errors());
    assert_eq!(result.output_results.len(), 1);
    assert_eq!(result.output_results[0].output, "alpha + beta");
}

#[tokio::test]
async fn s3_fail_forward_lets_independent_steps_succeed() {
    let tools = store();
    let plan = ToolPlan::new(vec![
        ToolPlanStep::new("s1", "failing_tool", "{}"),
        ToolPlanStep::new("s2", "echo", r#"{"message":"ok"}"#),
    ]);

    let result = ToolPlanExecutor::new(&tools).execute(&plan, None).await.unwrap();

    assert!(result.has_errors());
    assert!(result.errors.contains_key("s1"));
    let s2 = result.step_results.iter().find(|r| r.id == "s2").unwrap();
    assert_eq!(s2.output, "ok");
    assert!(s2.success);
}

#[tokio::test]
async fn s4_cycle_is_rejected_before_any_step_runs() {
    let tools = store();
    let plan = ToolPlan::new(vec![
        ToolPlanStep::new("s1", "concat", r#"{"a":"$ref:s2","b":"x"}"#),
        ToolPlanStep::new("s2", "concat", r#"{"a":"$ref:s1","b":"y"}"#),
    ]);

    let err = ToolPlanExecutor::new(&tools).execute(&plan, None).await.unwrap_err();

    match err {
        PlanError { kind: PlanValidationKind::Cycle, .. } => {}
        other => panic!("expected a cycle validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_tool_is_rejected_before_any_step_runs() {
    let tools = store();
    let plan = ToolPlan::new(vec![ToolPlanStep::new("s1", "does_not_exist", "{}")]);

    let err = ToolPlanExecutor::new(&tools).execute(&plan, None).await.unwrap_err();

    match err {
        PlanError { kind: PlanValidationKind::UnknownTool, .. } => {}
        other => panic!("expected an unknown-tool validation error, got {other:?}"),
    }
}
