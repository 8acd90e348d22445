//! Convenience re-exports for crates consuming `agentic-plan`.

pub use crate::error::PlanError;
pub use crate::executor::ToolPlanExecutor;
pub use crate::plan_tool::{execute_tool_plan_schema, PlanTool};
pub use crate::resolver::PlanReferenceResolver;
pub use crate::types::{PlanResult, StepResult, ToolPlan, ToolPlanStep, EXECUTE_TOOL_PLAN};
