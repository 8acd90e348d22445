//! The Tool-Plan Executor.
//!
//! A [`ToolPlan`] is a declarative DAG of tool invocations the LLM submits
//! in one call; [`ToolPlanExecutor`] validates it, resolves `$ref` tokens
//! between steps via [`PlanReferenceResolver`], and runs it in topologically
//! sorted waves with fail-forward semantics. [`PlanTool`] adapts the
//! executor to the `agentic_core::Tool` contract so it can be registered
//! into an `agentic_core::ToolStore` like any other tool.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod executor;
pub mod plan_tool;
pub mod prelude;
pub mod resolver;
pub mod types;

pub use error::{PlanError, ValidationResult};
pub use executor::ToolPlanExecutor;
pub use plan_tool::{execute_tool_plan_schema, PlanTool};
pub use resolver::PlanReferenceResolver;
pub use types::{PlanResult, StepResult, ToolPlan, ToolPlanStep, EXECUTE_TOOL_PLAN};
