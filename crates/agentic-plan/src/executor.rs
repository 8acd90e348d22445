//! The [`ToolPlanExecutor`]: validation, wave scheduling, fail-forward execution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentic_core::{PlanValidationKind, Tool, ToolStore};
use agentic_telemetry::{generate_span_id, generate_trace_id, SpanIds, TelemetryBus, TelemetryEvent};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::resolver::PlanReferenceResolver;
use crate::types::{PlanResult, StepResult, ToolPlan, EXECUTE_TOOL_PLAN};

/// Runs a validated [`ToolPlan`] to completion, dispatching independent
/// steps in parallel within each topological wave and propagating failures
/// forward without halting the whole plan.
///
/// Grounded on `astrid_mcp::tasks::TaskManager`'s state-machine bookkeeping
/// (pending → running → completed/failed/cancelled) for per-step lifecycle,
/// and on `astrid_runtime::subagent_executor`'s
/// `tokio::time::timeout` + cooperative-cancel pattern for the
/// caller-supplied deadline. Tool invocations don't carry a
/// cancellation token of their own (outside the `Tool` contract), so a
/// deadline is enforced by aborting the `JoinHandle` — the step's state
/// becomes "failed (cancelled)" the moment the wave notices the timeout.
pub struct ToolPlanExecutor<'a> {
    tools: &'a ToolStore,
    telemetry: Option<Arc<TelemetryBus>>,
}

impl<'a> ToolPlanExecutor<'a> {
    /// Build an executor bound to the given tool store for the lifetime of
    /// one plan execution.
    #[must_use]
    pub fn new(tools: &'a ToolStore) -> Self {
        Self { tools, telemetry: None }
    }

    /// Publish a [`TelemetryEvent`] for the plan as a whole and for each of
    /// its steps on `bus`. A fresh trace id is minted per [`Self::execute`]
    /// call, since a `ToolPlanExecutor` is bound to one plan invocation, not
    /// to a caller's wider session.
    #[must_use]
    pub fn with_telemetry(mut self, bus: Arc<TelemetryBus>) -> Self {
        self.telemetry = Some(bus);
        self
    }

    /// Validate a plan against the data-model invariants, without
    /// executing anything. Returns each step's dependency set (by index)
    /// for reuse by [`Self::execute`].
    ///
    /// # Errors
    ///
    /// Returns the first validation failure encountered: a duplicate id, an
    /// unknown tool, a self- or plan-recursive step, or a dependency cycle.
    pub fn validate(&self, plan: &ToolPlan) -> Result<Vec<HashSet<String>>, PlanError> {
        let mut seen_ids = HashSet::new();
        for step in &plan.steps {
            if !seen_ids.insert(step.id.clone()) {
                return Err(PlanError::for_step(PlanValidationKind::DuplicateId, &step.id));
            }
        }

        for step in &plan.steps {
            if step.tool_name == EXECUTE_TOOL_PLAN {
                return Err(PlanError::for_step(
                    PlanValidationKind::RecursivePlan,
                    &step.id,
                ));
            }
            if !self.tools.contains(&step.tool_name) {
                return Err(PlanError::for_step(PlanValidationKind::UnknownTool, &step.id));
            }
        }

        let mut deps_by_step = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            let mut deps = PlanReferenceResolver::dependencies(&step.arguments_json);
            if deps.contains(&step.id) {
                return Err(PlanError::for_step(PlanValidationKind::Cycle, &step.id));
            }
            deps.retain(|id| seen_ids.contains(id));
            deps_by_step.push(deps);
        }

        if Self::topological_waves(plan, &deps_by_step).is_none() {
            return Err(PlanError::new(PlanValidationKind::Cycle));
        }

        Ok(deps_by_step)
    }

    /// Repeatedly emit every remaining step whose dependencies are all
    /// already emitted, returning `None` if a pass stalls with steps still
    /// remaining (a cycle).
    fn topological_waves(
        plan: &ToolPlan,
        deps_by_step: &[HashSet<String>],
    ) -> Option<Vec<Vec<usize>>> {
        let mut resolved: HashSet<&str> = HashSet::new();
        let mut remaining: HashSet<usize> = (0..plan.steps.len()).collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let wave: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| deps_by_step[i].iter().all(|d| resolved.contains(d.as_str())))
                .collect();
            if wave.is_empty() {
                return None;
            }
            for &i in &wave {
                resolved.insert(&plan.steps[i].id);
                remaining.remove(&i);
            }
            waves.push(wave);
        }
        Some(waves)
    }

    /// Execute a validated plan, honoring an optional overall deadline.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanError`] if `plan` fails validation; no step runs in
    /// that case.
    pub async fn execute(
        &self,
        plan: &ToolPlan,
        deadline: Option<Duration>,
    ) -> Result<PlanResult, PlanError> {
        let deps_by_step = self.validate(plan)?;
        let waves = Self::topological_waves(plan, &deps_by_step)
            .expect("validate() already proved the plan is acyclic");

        let start = Instant::now();
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut step_results: Vec<StepResult> = Vec::with_capacity(plan.steps.len());
        let mut errors: HashMap<String, String> = HashMap::new();
        let mut deadline_exceeded = false;

        let bus = self.telemetry.as_deref();
        let trace_id = bus.map(|_| generate_trace_id());
        let root_span_id = bus.map(|_| generate_span_id());
        if let (Some(bus), Some(trace_id), Some(root_span_id)) = (bus, &trace_id, &root_span_id) {
            bus.publish(TelemetryEvent::started(
                SpanIds {
                    session_id: trace_id.clone(),
                    trace_id: trace_id.clone(),
                    span_id: root_span_id.clone(),
                    parent_span_id: None,
                },
                serde_json::json!({"component": "agentic_plan", "step_count": plan.steps.len()}),
            ));
        }
        let publish_step_failed = |step_id: &str, tool_name: Option<&str>, message: &str| {
            if let (Some(bus), Some(trace_id), Some(root_span_id)) = (bus, &trace_id, &root_span_id) {
                bus.publish(TelemetryEvent::failed(
                    SpanIds {
                        session_id: trace_id.clone(),
                        trace_id: trace_id.clone(),
                        span_id: generate_span_id(),
                        parent_span_id: Some(root_span_id.clone()),
                    },
                    serde_json::json!({"step_id": step_id, "tool_name": tool_name, "error": message}),
                ));
            }
        };

        for wave in &waves {
            let mut done: Vec<StepResult> = Vec::new();
            let mut spawned: Vec<SpawnedStep> = Vec::new();

            for &index in wave {
                let step = &plan.steps[index];
                let deps = &deps_by_step[index];

                if deadline_exceeded {
                    let msg = "cancelled (deadline exceeded)".to_string();
                    publish_step_failed(&step.id, Some(&step.tool_name), &msg);
                    failed.insert(step.id.clone());
                    errors.insert(step.id.clone(), msg.clone());
                    done.push(StepResult {
                        id: step.id.clone(),
                        success: false,
                        output: msg,
                        duration: Duration::ZERO,
                    });
                    continue;
                }

                if let Some(dep_id) = deps.iter().find(|d| failed.contains(d.as_str())) {
                    let msg = format!("dependency '{dep_id}' failed");
                    publish_step_failed(&step.id, Some(&step.tool_name), &msg);
                    failed.insert(step.id.clone());
                    errors.insert(step.id.clone(), msg.clone());
                    done.push(StepResult {
                        id: step.id.clone(),
                        success: false,
                        output: msg,
                        duration: Duration::ZERO,
                    });
                    continue;
                }

                let resolved_args =
                    match PlanReferenceResolver::resolve(&step.arguments_json, &outputs) {
                        Ok(args) => args,
                        Err(unresolved) => {
                            let msg = format!("unresolved reference '{unresolved}'");
                            publish_step_failed(&step.id, Some(&step.tool_name), &msg);
                            failed.insert(step.id.clone());
                            errors.insert(step.id.clone(), msg.clone());
                            done.push(StepResult {
                                id: step.id.clone(),
                                success: false,
                                output: msg,
                                duration: Duration::ZERO,
                            });
                            continue;
                        }
                    };

                let Some(tool) = self.tools.get(&step.tool_name).map(Arc::clone) else {
                    // Unreachable once validate() has run, kept for defense in depth.
                    let msg = format!("unknown tool: {}", step.tool_name);
                    publish_step_failed(&step.id, Some(&step.tool_name), &msg);
                    failed.insert(step.id.clone());
                    errors.insert(step.id.clone(), msg.clone());
                    done.push(StepResult {
                        id: step.id.clone(),
                        success: false,
                        output: msg,
                        duration: Duration::ZERO,
                    });
                    continue;
                };

                let span_id = bus.map(|_| generate_span_id());
                if let (Some(bus), Some(trace_id), Some(span_id)) = (bus, &trace_id, &span_id) {
                    bus.publish(TelemetryEvent::started(
                        SpanIds {
                            session_id: trace_id.clone(),
                            trace_id: trace_id.clone(),
                            span_id: span_id.clone(),
                            parent_span_id: root_span_id.clone(),
                        },
                        serde_json::json!({"step_id": step.id, "tool_name": step.tool_name}),
                    ));
                }

                let args_value: Value = serde_json::from_str(&resolved_args).unwrap_or(Value::Null);
                let started = Instant::now();
                let handle = tokio::spawn(invoke_tool(tool, args_value));
                spawned.push(SpawnedStep {
                    id: step.id.clone(),
                    tool_name: step.tool_name.clone(),
                    span_id,
                    handle,
                    started,
                });
            }

            let remaining_deadline = deadline.map(|d| d.saturating_sub(start.elapsed()));
            for spawned_step in spawned {
                let tool_name = spawned_step.tool_name.clone();
                let span_id = spawned_step.span_id.clone();
                let resolved = spawned_step.join(remaining_deadline).await;
                if let (Some(bus), Some(trace_id), Some(span_id)) = (bus, &trace_id, &span_id) {
                    let ids = SpanIds {
                        session_id: trace_id.clone(),
                        trace_id: trace_id.clone(),
                        span_id: span_id.clone(),
                        parent_span_id: root_span_id.clone(),
                    };
                    let attributes =
                        serde_json::json!({"step_id": resolved.id, "tool_name": tool_name, "output": resolved.output});
                    bus.publish(if resolved.success {
                        TelemetryEvent::completed(ids, attributes)
                    } else {
                        TelemetryEvent::failed(ids, attributes)
                    });
                }
                if !resolved.success {
                    failed.insert(resolved.id.clone());
                    errors.insert(resolved.id.clone(), resolved.output.clone());
                } else {
                    outputs.insert(resolved.id.clone(), resolved.output.clone());
                }
                done.push(resolved);
            }

            step_results.extend(done);

            if deadline.is_some_and(|d| start.elapsed() >= d) {
                debug!("tool plan deadline exceeded; remaining waves will be cancelled");
                deadline_exceeded = true;
            }
        }

        let output_results = match &plan.output_steps {
            Some(ids) => step_results
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect(),
            None => step_results.clone(),
        };

        if !errors.is_empty() {
            warn!(
                failed = errors.len(),
                total = plan.steps.len(),
                "tool plan completed with failures"
            );
        }

        if let (Some(bus), Some(trace_id), Some(root_span_id)) = (bus, &trace_id, &root_span_id) {
            let ids = SpanIds {
                session_id: trace_id.clone(),
                trace_id: trace_id.clone(),
                span_id: root_span_id.clone(),
                parent_span_id: None,
            };
            let attributes = serde_json::json!({"failed_steps": errors.len(), "total_steps": plan.steps.len()});
            bus.publish(if errors.is_empty() {
                TelemetryEvent::completed(ids, attributes)
            } else {
                TelemetryEvent::failed(ids, attributes)
            });
        }

        Ok(PlanResult {
            step_results,
            output_results,
            errors,
            total_duration: start.elapsed(),
        })
    }
}

async fn invoke_tool(tool: Arc<dyn Tool>, args: Value) -> (bool, String) {
    let output = tool.invoke(args).await;
    (output.is_error, output.content.as_text())
}

struct SpawnedStep {
    id: String,
    tool_name: String,
    span_id: Option<String>,
    handle: tokio::task::JoinHandle<(bool, String)>,
    started: Instant,
}

impl SpawnedStep {
    async fn join(self, deadline: Option<Duration>) -> StepResult {
        let Self { id, mut handle, started, .. } = self;
        match deadline {
            Some(remaining) if remaining > Duration::ZERO => {
                match tokio::time::timeout(remaining, &mut handle).await {
                    Ok(Ok((is_error, output))) => StepResult {
                        id,
                        success: !is_error,
                        output,
                        duration: started.elapsed(),
                    },
                    Ok(Err(join_error)) => StepResult {
                        id,
                        success: false,
                        output: format!("step task panicked: {join_error}"),
                        duration: started.elapsed(),
                    },
                    Err(_elapsed) => {
                        handle.abort();
                        StepResult {
                            id,
                            success: false,
                            output: "cancelled (deadline exceeded)".to_string(),
                            duration: started.elapsed(),
                        }
                    }
                }
            }
            Some(_zero_or_negative) => {
                handle.abort();
                StepResult {
                    id,
                    success: false,
                    output: "cancelled (deadline exceeded)".to_string(),
                    duration: started.elapsed(),
                }
            }
            None => match handle.await {
                Ok((is_error, output)) => StepResult {
                    id,
                    success: !is_error,
                    output,
                    duration: started.elapsed(),
                },
                Err(join_error) => StepResult {
                    id,
                    success: false,
                    output: format!("step task panicked: {join_error}"),
                    duration: started.elapsed(),
                },
            },
        }
    }
}
