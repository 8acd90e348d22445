//! [`AgenticLoop`]: the turn-by-turn driver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agentic_core::{
    AgentError, AgentRunState, ApprovalDecision, Context, ExecutedToolCall, GuardrailPhase,
    InputItem, RetryPolicy, TerminalReason, ToolCall, TokenUsage,
};
use agentic_llm::{LlmRequest, LlmResponse, Responder, ResponseFormat, ResponseOutputItem, Usage};
use agentic_telemetry::{generate_span_id, generate_trace_id, SpanIds, TelemetryBus, TelemetryEvent};
use serde_json::Value;

use crate::agent::Agent;
use crate::error::{LoopError, LoopResult};
use crate::guardrail::GuardrailVerdict;

/// Mints one trace id per run/resume call and publishes [`TelemetryEvent`]s
/// for each loop turn and tool call on the agent's configured bus, if any.
///
/// A paused [`AgentRunState`] doesn't carry a trace id forward, so a
/// `resume()` call starts a fresh trace rather than continuing the one from
/// before the pause.
struct RunTelemetry {
    bus: Option<Arc<TelemetryBus>>,
    trace_id: Option<String>,
    run_span_id: Option<String>,
}

impl RunTelemetry {
    fn new(bus: Option<&Arc<TelemetryBus>>) -> Self {
        let bus = bus.cloned();
        let trace_id = bus.as_ref().map(|_| generate_trace_id());
        let run_span_id = bus.as_ref().map(|_| generate_span_id());
        Self { bus, trace_id, run_span_id }
    }

    fn run_span_id(&self) -> &str {
        self.run_span_id.as_deref().unwrap_or("")
    }

    /// A fresh span id for one turn or tool call, only when telemetry is
    /// actually wired up.
    fn new_span(&self) -> Option<String> {
        self.bus.as_ref().map(|_| generate_span_id())
    }

    fn publish(
        &self,
        session_id: &str,
        span_id: &str,
        parent_span_id: Option<&str>,
        make: fn(SpanIds, Value) -> TelemetryEvent,
        attributes: Value,
    ) {
        if let (Some(bus), Some(trace_id)) = (&self.bus, &self.trace_id) {
            bus.publish(make(
                SpanIds {
                    session_id: session_id.to_string(),
                    trace_id: trace_id.clone(),
                    span_id: span_id.to_string(),
                    parent_span_id: parent_span_id.map(str::to_string),
                },
                attributes,
            ));
        }
    }
}

/// One tool call dispatched during a run, kept for the caller's own
/// telemetry/debugging; the loop's own telemetry spans are emitted
/// separately.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    /// The call id this execution answers.
    pub call_id: String,
    /// Tool name invoked.
    pub tool_name: String,
    /// Whether the tool reported an error.
    pub is_error: bool,
    /// Wall-clock time spent inside `Tool::invoke`.
    pub duration: Duration,
}

impl From<ExecutedToolCall> for ToolExecution {
    fn from(executed: ExecutedToolCall) -> Self {
        Self {
            call_id: executed.call_id,
            tool_name: executed.tool_name,
            is_error: executed.is_error,
            duration: Duration::from_millis(executed.duration_ms),
        }
    }
}

impl From<ToolExecution> for ExecutedToolCall {
    fn from(execution: ToolExecution) -> Self {
        Self {
            call_id: execution.call_id,
            tool_name: execution.tool_name,
            is_error: execution.is_error,
            duration_ms: u64::try_from(execution.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

fn usage_to_token_usage(usage: Usage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    }
}

fn token_usage_to_usage(usage: TokenUsage) -> Usage {
    Usage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
    }
}

/// Everything a run accumulated, successful or not.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The final assistant text, if the run reached a text-producing turn.
    pub final_text: Option<String>,
    /// The final text parsed against the configured structured-output
    /// schema, present only when [`ResponseFormat::Structured`] is set and
    /// parsing succeeded.
    pub final_parsed: Option<Value>,
    /// Every tool call dispatched across the whole run, in execution order.
    pub executions: Vec<ToolExecution>,
    /// Agent names handed off to, in the order handoffs occurred.
    pub handoffs_taken: Vec<String>,
    /// Turns consumed across the whole run, including any prior to a
    /// resumed pause.
    pub turns_used: u32,
    /// Token accounting summed across every Responder call in the run.
    pub usage: Usage,
    /// Why the run stopped.
    pub terminal_reason: TerminalReason,
    /// The context as it stood when the run stopped.
    pub context: Context,
}

/// What [`AgenticLoop::run`] (or [`AgenticLoop::resume`]) produced.
pub enum LoopOutcome {
    /// The run reached a terminal condition other than a pause.
    Finished(RunResult),
    /// The run paused on a `needsConfirmation` tool call; the caller holds
    /// `run_state` to resume later via [`AgenticLoop::resume`].
    Paused {
        /// Partial accumulation up to the pause.
        result: RunResult,
        /// Snapshot to resume from.
        run_state: AgentRunState,
    },
}

/// Drives an [`Agent`] through turns against a [`Context`] until a terminal
/// condition holds.
///
/// Grounded on `astrid_runtime::runtime::execution::run_loop`'s shape:
/// stream/complete, collect tool calls, execute and append outputs,
/// `continue`, else finalize. Extended with the handoff short-circuit
/// and a pending-approval pause.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgenticLoop;

impl AgenticLoop {
    /// A stateless driver; construct once and reuse across runs.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run `agent` against `context` from the start (first turn runs input
    /// guardrails).
    pub async fn run(&self, agent: Arc<Agent>, context: Context) -> LoopResult<LoopOutcome> {
        let telemetry = RunTelemetry::new(agent.telemetry());
        self.drive(agent, context, 0, true, Vec::new(), Vec::new(), Usage::default(), telemetry)
            .await
    }

    /// Resume a paused run. `decision` is applied to `run_state` to produce
    /// the context item answering the paused call; dispatch then re-enters
    /// the same response's remaining tool calls (the ones after the one
    /// that paused) before the loop advances to a fresh turn. Executions,
    /// handoffs, and usage accumulated before the pause are carried forward
    /// so the resumed run's final tally stays cumulative.
    ///
    /// # Panics
    ///
    /// Panics if `run_state` was already resumed once — a programmer
    /// error, since [`AgentRunState`] is meant to be consumed exactly once.
    pub async fn resume(
        &self,
        agent: Arc<Agent>,
        mut run_state: AgentRunState,
        decision: ApprovalDecision,
    ) -> LoopResult<LoopOutcome> {
        let remaining_calls = std::mem::take(&mut run_state.remaining_calls);
        let mut executions: Vec<ToolExecution> = std::mem::take(&mut run_state.executions_so_far)
            .into_iter()
            .map(ToolExecution::from)
            .collect();
        let handoffs_taken = std::mem::take(&mut run_state.handoffs_so_far);
        let mut usage_total = token_usage_to_usage(run_state.usage_so_far);

        let outcome = run_state
            .resume(decision)
            .expect("run state must not already be resumed");
        let mut context = run_state.context;
        context.push(outcome.context_item);

        let telemetry = RunTelemetry::new(agent.telemetry());

        if !remaining_calls.is_empty() {
            let pause = self
                .dispatch_tool_calls(
                    &agent,
                    &remaining_calls,
                    &mut context,
                    &mut executions,
                    &telemetry,
                    Some(telemetry.run_span_id()),
                )
                .await;
            if let Some((pending_call, still_remaining)) = pause {
                let new_run_state = AgentRunState::new(
                    context.clone(),
                    pending_call,
                    still_remaining,
                    executions.iter().cloned().map(ExecutedToolCall::from).collect(),
                    handoffs_taken.clone(),
                    usage_to_token_usage(usage_total),
                    outcome.turns_used,
                );
                let result = RunResult {
                    final_text: None,
                    final_parsed: None,
                    executions,
                    handoffs_taken,
                    turns_used: outcome.turns_used,
                    usage: usage_total,
                    terminal_reason: TerminalReason::PausedForApproval,
                    context,
                };
                return Ok(LoopOutcome::Paused {
                    result,
                    run_state: new_run_state,
                });
            }
        }

        self.drive(
            agent,
            context,
            outcome.turns_used,
            false,
            handoffs_taken,
            executions,
            usage_total,
            telemetry,
        )
        .await
    }

    #[allow(clippy::too_many_lines, clippy::too_many_arguments)]
    async fn drive(
        &self,
        initial_agent: Arc<Agent>,
        mut context: Context,
        mut turns_used: u32,
        mut run_input_guardrails: bool,
        mut handoffs_taken: Vec<String>,
        mut executions: Vec<ToolExecution>,
        mut usage_total: Usage,
        telemetry: RunTelemetry,
    ) -> LoopResult<LoopOutcome> {
        let mut agent = initial_agent;
        let mut turn_budget = agent.max_turns();
        let mut last_text = String::new();

        loop {
            if run_input_guardrails {
                if let Some(text) = context.latest_user_text() {
                    for guardrail in agent.input_guardrails() {
                        let verdict = guardrail.check(GuardrailPhase::Input, &text, &context).await;
                        if !verdict.is_pass() {
                            telemetry.publish(
                                agent.name(),
                                telemetry.run_span_id(),
                                None,
                                TelemetryEvent::agent_failed,
                                serde_json::json!({"reason": "input_guardrail_failed", "guardrail": guardrail.name()}),
                            );
                            return Ok(LoopOutcome::Finished(RunResult {
                                final_text: None,
                                final_parsed: None,
                                executions,
                                handoffs_taken,
                                turns_used,
                                usage: usage_total,
                                terminal_reason: TerminalReason::GuardrailFailed,
                                context,
                            }));
                        }
                    }
                }
                run_input_guardrails = false;
            }

            if turns_used >= turn_budget {
                telemetry.publish(
                    agent.name(),
                    telemetry.run_span_id(),
                    None,
                    TelemetryEvent::agent_failed,
                    serde_json::json!({"reason": "turn_budget_exceeded", "turns_used": turns_used}),
                );
                return Ok(LoopOutcome::Finished(RunResult {
                    final_text: if last_text.is_empty() {
                        None
                    } else {
                        Some(last_text)
                    },
                    final_parsed: None,
                    executions,
                    handoffs_taken,
                    turns_used,
                    usage: usage_total,
                    terminal_reason: TerminalReason::TurnBudgetExceeded,
                    context,
                }));
            }

            let turn_span_id = telemetry.new_span();
            if let Some(span_id) = &turn_span_id {
                telemetry.publish(
                    agent.name(),
                    span_id,
                    Some(telemetry.run_span_id()),
                    TelemetryEvent::started,
                    serde_json::json!({"turn": turns_used + 1}),
                );
            }

            let view = agent
                .window_strategy()
                .reduce(context.items(), agent.max_tokens(), agent.token_counter().as_ref())
                .await;

            let request = LlmRequest {
                instructions: agent.system_prompt(),
                tool_schemas: agent.advertised_tool_schemas(context.latest_user_text().as_deref()),
                items: view,
                response_format: agent.response_format().clone(),
                temperature: agent.temperature(),
                max_output_tokens: agent.max_output_tokens(),
                metadata: None,
                trace_metadata: None,
            };

            let response = match call_with_retry(agent.responder().as_ref(), &request, agent.retry_policy()).await {
                Ok(response) => response,
                Err(error) => {
                    if let Some(span_id) = &turn_span_id {
                        telemetry.publish(
                            agent.name(),
                            span_id,
                            Some(telemetry.run_span_id()),
                            TelemetryEvent::failed,
                            serde_json::json!({"error": error.to_string()}),
                        );
                    }
                    telemetry.publish(
                        agent.name(),
                        telemetry.run_span_id(),
                        None,
                        TelemetryEvent::agent_failed,
                        serde_json::json!({"reason": "responder_error", "error": error.to_string()}),
                    );
                    return Err(LoopError::Responder(error));
                }
            };

            if let Some(span_id) = &turn_span_id {
                telemetry.publish(
                    agent.name(),
                    span_id,
                    Some(telemetry.run_span_id()),
                    TelemetryEvent::completed,
                    serde_json::json!({
                        "input_tokens": response.usage.input_tokens,
                        "output_tokens": response.usage.output_tokens,
                    }),
                );
            }

            usage_total.input_tokens += response.usage.input_tokens;
            usage_total.output_tokens += response.usage.output_tokens;

            for item in &response.output {
                if let ResponseOutputItem::Message { role, content } = item {
                    context.push(InputItem::Message {
                        role: *role,
                        content: content.clone(),
                    });
                }
            }
            turns_used += 1;

            if let Some(handoff_call) = response.handoff() {
                match agent.find_handoff(&handoff_call.target_agent) {
                    Some(handoff) => {
                        let target = handoff.target();
                        turn_budget += target.max_turns();
                        handoffs_taken.push(handoff.target_name().to_string());
                        if let Some(input) = handoff_call.input.clone() {
                            context.push(InputItem::user(input));
                        }
                        agent = target;
                        continue;
                    }
                    None => {
                        // Unknown handoff target: no terminal condition names this case,
                        // so treat it like an unknown tool — fail forward and let the
                        // agent's next turn see the rejection.
                        context.push(InputItem::developer(format!(
                            "handoff target '{}' is not declared on this agent",
                            handoff_call.target_agent
                        )));
                        continue;
                    }
                }
            }

            if response.has_tool_calls() {
                let calls: Vec<ToolCall> = response.tool_calls().into_iter().cloned().collect();
                let pause = self
                    .dispatch_tool_calls(
                        &agent,
                        &calls,
                        &mut context,
                        &mut executions,
                        &telemetry,
                        turn_span_id.as_deref(),
                    )
                    .await;
                if let Some((pending_call, remaining_calls)) = pause {
                    let run_state = AgentRunState::new(
                        context.clone(),
                        pending_call,
                        remaining_calls,
                        executions.iter().cloned().map(ExecutedToolCall::from).collect(),
                        handoffs_taken.clone(),
                        usage_to_token_usage(usage_total),
                        turns_used,
                    );
                    let result = RunResult {
                        final_text: None,
                        final_parsed: None,
                        executions,
                        handoffs_taken,
                        turns_used,
                        usage: usage_total,
                        terminal_reason: TerminalReason::PausedForApproval,
                        context,
                    };
                    return Ok(LoopOutcome::Paused { result, run_state });
                }
                continue;
            }

            let text = response.text();
            last_text.clone_from(&text);

            for guardrail in agent.output_guardrails() {
                let verdict = guardrail.check(GuardrailPhase::Output, &text, &context).await;
                if !verdict.is_pass() {
                    telemetry.publish(
                        agent.name(),
                        telemetry.run_span_id(),
                        None,
                        TelemetryEvent::agent_failed,
                        serde_json::json!({"reason": "output_guardrail_failed", "guardrail": guardrail.name()}),
                    );
                    return Ok(LoopOutcome::Finished(RunResult {
                        final_text: Some(text),
                        final_parsed: None,
                        executions,
                        handoffs_taken,
                        turns_used,
                        usage: usage_total,
                        terminal_reason: TerminalReason::GuardrailFailed,
                        context,
                    }));
                }
            }

            let final_parsed = match agent.response_format() {
                ResponseFormat::Structured { .. } => match serde_json::from_str::<Value>(&text) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        telemetry.publish(
                            agent.name(),
                            telemetry.run_span_id(),
                            None,
                            TelemetryEvent::agent_failed,
                            serde_json::json!({"reason": "output_parse_error"}),
                        );
                        return Ok(LoopOutcome::Finished(RunResult {
                            final_text: Some(text),
                            final_parsed: None,
                            executions,
                            handoffs_taken,
                            turns_used,
                            usage: usage_total,
                            terminal_reason: TerminalReason::OutputParseError,
                            context,
                        }));
                    }
                },
                ResponseFormat::Free => None,
            };

            return Ok(LoopOutcome::Finished(RunResult {
                final_text: Some(text),
                final_parsed,
                executions,
                handoffs_taken,
                turns_used,
                usage: usage_total,
                terminal_reason: TerminalReason::Completed,
                context,
            }));
        }
    }

    /// Execute tool calls from `calls` against `agent`'s store in order,
    /// appending outputs to `context`. Stops at the first call requiring
    /// approval and returns it paired with the calls after it that were
    /// never reached, for the caller to carry into an [`AgentRunState`] and
    /// dispatch on resume.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch_tool_calls(
        &self,
        agent: &Agent,
        calls: &[ToolCall],
        context: &mut Context,
        executions: &mut Vec<ToolExecution>,
        telemetry: &RunTelemetry,
        parent_span_id: Option<&str>,
    ) -> Option<(ToolCall, Vec<ToolCall>)> {
        for (index, call) in calls.iter().enumerate() {
            let Some(tool) = agent.tools().get(&call.tool_name) else {
                context.push(InputItem::tool_error(
                    &call.call_id,
                    format!("Unknown tool: {}", call.tool_name),
                ));
                continue;
            };

            if tool.needs_confirmation() {
                return Some((call.clone(), calls[index + 1..].to_vec()));
            }

            let parsed: Result<Value, _> = serde_json::from_str(&call.raw_arguments_json);
            let input = match (tool.strict(), parsed) {
                (_, Ok(value)) => value,
                (true, Err(err)) => {
                    context.push(InputItem::tool_error(
                        &call.call_id,
                        format!("invalid arguments for {}: {err}", call.tool_name),
                    ));
                    continue;
                }
                (false, Err(_)) => Value::Null,
            };

            let tool_span_id = telemetry.new_span();
            if let Some(span_id) = &tool_span_id {
                telemetry.publish(
                    agent.name(),
                    span_id,
                    parent_span_id,
                    TelemetryEvent::started,
                    serde_json::json!({"tool_name": call.tool_name, "call_id": call.call_id}),
                );
            }

            let started = Instant::now();
            let output = tool.invoke(input).await;

            if let Some(span_id) = &tool_span_id {
                telemetry.publish(
                    agent.name(),
                    span_id,
                    parent_span_id,
                    if output.is_error { TelemetryEvent::failed } else { TelemetryEvent::completed },
                    serde_json::json!({"tool_name": call.tool_name, "call_id": call.call_id}),
                );
            }

            executions.push(ToolExecution {
                call_id: call.call_id.clone(),
                tool_name: call.tool_name.clone(),
                is_error: output.is_error,
                duration: started.elapsed(),
            });
            context.push(InputItem::ToolCallOutput {
                call_id: call.call_id.clone(),
                is_error: output.is_error,
                payload: output.into_context_payload(),
            });
        }
        None
    }
}

/// Call the Responder with retry policy, translating a
/// transport error into [`AgentError::ResponderError`] only once retries
/// are exhausted (or the error is not retryable at all).
async fn call_with_retry(
    responder: &dyn Responder,
    request: &LlmRequest,
    policy: &RetryPolicy,
) -> Result<LlmResponse, AgentError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match responder.complete(request).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                let status_code = err.status_code();
                let retryable = policy.is_retryable_status(status_code);
                if retryable && !policy.is_exhausted(attempt) {
                    tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
                    continue;
                }
                let retryable_class = if retryable {
                    agentic_core::RetryableClass::Transient
                } else {
                    agentic_core::RetryableClass::Permanent
                };
                return Err(AgentError::ResponderError {
                    retryable_class,
                    status_code,
                    cause: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agentic_core::ToolOutput;
    use agentic_llm::{
        handoff_response, multi_tool_call_response, text_response, tool_call_response, TestResponder,
    };
    use agentic_window::{HeuristicTokenCounter, SlidingWindow};
    use async_trait::async_trait;

    use super::*;
    use crate::agent::Agent;
    use crate::handoff::Handoff;

    struct Echo;

    #[async_trait]
    impl agentic_core::Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes the message field"
        }
        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn invoke(&self, input: Value) -> ToolOutput {
            ToolOutput::text(input["message"].as_str().unwrap_or_default())
        }
    }

    fn agent_with_responder(responder: TestResponder) -> Arc<Agent> {
        Arc::new(Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(responder),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        ))
    }

    #[tokio::test]
    async fn completes_on_first_text_only_response() {
        let agent = agent_with_responder(TestResponder::new().with_response(text_response("hi there")));
        let mut context = Context::new();
        context.push(InputItem::user("hello"));
        let outcome = AgenticLoop::new().run(agent, context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert_eq!(result.final_text.as_deref(), Some("hi there"));
                assert_eq!(result.turns_used, 1);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn executes_tool_call_then_completes() {
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(
                TestResponder::new()
                    .with_response(tool_call_response("c1", "echo", "{\"message\":\"hi\"}"))
                    .with_response(text_response("done")),
            ),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_tool(Arc::new(Echo));
        let mut context = Context::new();
        context.push(InputItem::user("say hi"));
        let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert_eq!(result.executions.len(), 1);
                assert!(!result.executions[0].is_error);
                assert_eq!(result.turns_used, 2);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_call_fails_forward() {
        let agent = agent_with_responder(
            TestResponder::new()
                .with_response(tool_call_response("c1", "does_not_exist", "{}"))
                .with_response(text_response("recovered")),
        );
        let mut context = Context::new();
        context.push(InputItem::user("hi"));
        let outcome = AgenticLoop::new().run(agent, context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert!(result.executions.is_empty());
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn turn_budget_exceeded_when_tool_calls_never_stop() {
        let responses = (0..5).map(|i| tool_call_response(&format!("c{i}"), "echo", "{\"message\":\"x\"}"));
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(TestResponder::new().with_responses(responses)),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_tool(Arc::new(Echo))
        .with_max_turns(3);
        let mut context = Context::new();
        context.push(InputItem::user("loop forever"));
        let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::TurnBudgetExceeded);
                assert_eq!(result.turns_used, 3);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn handoff_switches_active_agent_and_records_it() {
        let billing = Arc::new(agent_with_responder(TestResponder::new().with_response(text_response("billing here"))));
        let triage = Agent::new(
            "triage",
            "route requests",
            Arc::new(TestResponder::new().with_response(handoff_response("billing", Some("please help")))),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_handoff(Handoff::new("billing", "handles billing", Arc::clone(&billing)));
        let mut context = Context::new();
        context.push(InputItem::user("I have a billing question"));
        let outcome = AgenticLoop::new().run(Arc::new(triage), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert_eq!(result.handoffs_taken, vec!["billing".to_string()]);
                assert_eq!(result.final_text.as_deref(), Some("billing here"));
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn output_guardrail_rejects_final_text() {
        struct RejectAll;
        #[async_trait]
        impl crate::guardrail::Guardrail for RejectAll {
            fn name(&self) -> &str {
                "reject_all"
            }
            async fn check(
                &self,
                _phase: GuardrailPhase,
                _text: &str,
                _context: &Context,
            ) -> GuardrailVerdict {
                GuardrailVerdict::Fail("nope".to_string())
            }
        }
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(TestResponder::new().with_response(text_response("blocked text"))),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_output_guardrail(Arc::new(RejectAll));
        let mut context = Context::new();
        context.push(InputItem::user("hi"));
        let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::GuardrailFailed);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn structured_output_parse_failure_is_terminal() {
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(TestResponder::new().with_response(text_response("not json"))),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_response_format(ResponseFormat::Structured {
            schema: serde_json::json!({"type": "object"}),
        });
        let mut context = Context::new();
        context.push(InputItem::user("hi"));
        let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::OutputParseError);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn needs_confirmation_tool_pauses_the_loop() {
        struct DangerousTool;
        #[async_trait]
        impl agentic_core::Tool for DangerousTool {
            fn name(&self) -> &str {
                "delete_file"
            }
            fn description(&self) -> &str {
                "deletes a file"
            }
            fn schema(&self) -> Value {
                serde_json::json!({"type": "object"})
            }
            fn needs_confirmation(&self) -> bool {
                true
            }
            async fn invoke(&self, _input: Value) -> ToolOutput {
                ToolOutput::text("deleted")
            }
        }
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(
                TestResponder::new()
                    .with_response(tool_call_response("c1", "delete_file", "{}"))
                    .with_response(text_response("all done")),
            ),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_tool(Arc::new(DangerousTool));
        let agent = Arc::new(agent);
        let mut context = Context::new();
        context.push(InputItem::user("delete it"));
        let outcome = AgenticLoop::new().run(Arc::clone(&agent), context).await.unwrap();
        let run_state = match outcome {
            LoopOutcome::Paused { result, run_state } => {
                assert_eq!(result.terminal_reason, TerminalReason::PausedForApproval);
                run_state
            }
            LoopOutcome::Finished(_) => panic!("expected paused"),
        };
        let outcome = AgenticLoop::new()
            .resume(
                agent,
                run_state,
                ApprovalDecision::Approved(ToolOutput::text("deleted")),
            )
            .await
            .unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert_eq!(result.final_text.as_deref(), Some("all done"));
            }
            LoopOutcome::Paused { .. } => panic!("expected finished after resume"),
        }
    }

    #[tokio::test]
    async fn sibling_tool_calls_after_a_pause_are_carried_and_dispatched_on_resume() {
        struct DangerousTool;
        #[async_trait]
        impl agentic_core::Tool for DangerousTool {
            fn name(&self) -> &str {
                "delete_file"
            }
            fn description(&self) -> &str {
                "deletes a file"
            }
            fn schema(&self) -> Value {
                serde_json::json!({"type": "object"})
            }
            fn needs_confirmation(&self) -> bool {
                true
            }
            async fn invoke(&self, _input: Value) -> ToolOutput {
                ToolOutput::text("deleted")
            }
        }
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(
                TestResponder::new()
                    .with_response(multi_tool_call_response(&[
                        ("c1", "delete_file", "{}"),
                        ("c2", "echo", "{\"message\":\"hi\"}"),
                    ]))
                    .with_response(text_response("all done")),
            ),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_tool(Arc::new(DangerousTool))
        .with_tool(Arc::new(Echo));
        let agent = Arc::new(agent);
        let mut context = Context::new();
        context.push(InputItem::user("delete it then echo"));
        let outcome = AgenticLoop::new().run(Arc::clone(&agent), context).await.unwrap();
        let run_state = match outcome {
            LoopOutcome::Paused { result, run_state } => {
                assert_eq!(result.terminal_reason, TerminalReason::PausedForApproval);
                assert!(result.executions.is_empty());
                assert_eq!(run_state.remaining_calls.len(), 1);
                assert_eq!(run_state.remaining_calls[0].tool_name, "echo");
                run_state
            }
            LoopOutcome::Finished(_) => panic!("expected paused"),
        };
        let outcome = AgenticLoop::new()
            .resume(
                agent,
                run_state,
                ApprovalDecision::Approved(ToolOutput::text("deleted")),
            )
            .await
            .unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::Completed);
                assert_eq!(result.final_text.as_deref(), Some("all done"));
                assert_eq!(result.executions.len(), 1);
                assert_eq!(result.executions[0].tool_name, "echo");
                assert!(!result.executions[0].is_error);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished after resume"),
        }
    }

    #[tokio::test]
    async fn input_guardrail_rejects_before_any_responder_call() {
        struct RejectEmpty;
        #[async_trait]
        impl crate::guardrail::Guardrail for RejectEmpty {
            fn name(&self) -> &str {
                "reject_empty"
            }
            async fn check(
                &self,
                _phase: GuardrailPhase,
                text: &str,
                _context: &Context,
            ) -> GuardrailVerdict {
                if text.trim().is_empty() {
                    GuardrailVerdict::Fail("empty input".to_string())
                } else {
                    GuardrailVerdict::Pass
                }
            }
        }
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            // Queue is empty: if the guardrail failed to short-circuit, the
            // Responder call would error instead of hitting this assertion.
            Arc::new(TestResponder::new()),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_input_guardrail(Arc::new(RejectEmpty));
        let mut context = Context::new();
        context.push(InputItem::user("   "));
        let outcome = AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();
        match outcome {
            LoopOutcome::Finished(result) => {
                assert_eq!(result.terminal_reason, TerminalReason::GuardrailFailed);
            }
            LoopOutcome::Paused { .. } => panic!("expected finished"),
        }
    }

    #[tokio::test]
    async fn with_telemetry_publishes_turn_and_tool_spans() {
        let bus = Arc::new(agentic_telemetry::TelemetryBus::new(16));
        let mut receiver = bus.subscribe();
        let agent = Agent::new(
            "main",
            "you are a helpful agent",
            Arc::new(
                TestResponder::new()
                    .with_response(tool_call_response("c1", "echo", "{\"message\":\"hi\"}"))
                    .with_response(text_response("done")),
            ),
            Arc::new(SlidingWindow::new()),
            Arc::new(HeuristicTokenCounter),
        )
        .with_tool(Arc::new(Echo))
        .with_telemetry(Arc::clone(&bus));
        let mut context = Context::new();
        context.push(InputItem::user("say hi"));
        AgenticLoop::new().run(Arc::new(agent), context).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), receiver.recv()).await
        {
            kinds.push(match &*event {
                TelemetryEvent::ResponseStarted { .. } => "started",
                TelemetryEvent::ResponseCompleted { .. } => "completed",
                TelemetryEvent::ResponseFailed { .. } => "failed",
                TelemetryEvent::AgentFailed { .. } => "agent_failed",
            });
        }

        // Two turns (tool call + final text) plus one tool call span, each
        // started and completed.
        assert_eq!(kinds.iter().filter(|k| **k == "started").count(), 3);
        assert_eq!(kinds.iter().filter(|k| **k == "completed").count(), 3);
    }
}
