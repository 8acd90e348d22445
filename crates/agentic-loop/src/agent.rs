//! The [`Agent`] configuration value.

use std::sync::Arc;

use agentic_core::{RetryPolicy, Tool, ToolStore};
use agentic_llm::{Responder, ResponseFormat};
use agentic_telemetry::TelemetryBus;
use agentic_window::{TokenCounter, WindowStrategy};

use crate::guardrail::Guardrail;
use crate::handoff::Handoff;
use crate::tool_search::{AllTools, ToolSearchStrategy};

/// Everything the loop needs to drive one agent's turns: its instructions,
/// tools, handoff targets, guardrails, window strategy and Responder.
///
/// An `Agent` is immutable once built and cheap to share: `AgenticLoop`
/// takes it behind an `Arc`, and a [`Handoff`] holds another `Arc<Agent>`
/// for its target. Assembled with consuming `with_*` setters rather than a
/// separate builder type, following the `ModelConfig`/`RunConfig`
/// convention of plain structs with chained `with_*(mut self, ...) -> Self`.
pub struct Agent {
    name: String,
    instructions: String,
    skill_sections: Vec<String>,
    tools: ToolStore,
    handoffs: Vec<Handoff>,
    input_guardrails: Vec<Arc<dyn Guardrail>>,
    output_guardrails: Vec<Arc<dyn Guardrail>>,
    max_turns: u32,
    window_strategy: Arc<dyn WindowStrategy>,
    token_counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
    responder: Arc<dyn Responder>,
    response_format: ResponseFormat,
    temperature: Option<f64>,
    max_output_tokens: Option<usize>,
    retry_policy: RetryPolicy,
    tool_search: Option<Arc<dyn ToolSearchStrategy>>,
    telemetry: Option<Arc<TelemetryBus>>,
}

/// Default turn budget, chosen generously
/// enough that simple tool chains never hit it by accident.
const DEFAULT_MAX_TURNS: u32 = 10;

impl Agent {
    /// Start building an agent. `max_tokens` defaults to the Responder's
    /// own `max_context_length`, since that is the only sensible default
    /// absent an explicit override.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        responder: Arc<dyn Responder>,
        window_strategy: Arc<dyn WindowStrategy>,
        token_counter: Arc<dyn TokenCounter>,
    ) -> Self {
        let max_tokens = responder.max_context_length();
        Self {
            name: name.into(),
            instructions: instructions.into(),
            skill_sections: Vec::new(),
            tools: ToolStore::new(),
            handoffs: Vec::new(),
            input_guardrails: Vec::new(),
            output_guardrails: Vec::new(),
            max_turns: DEFAULT_MAX_TURNS,
            window_strategy,
            token_counter,
            max_tokens,
            responder,
            response_format: ResponseFormat::Free,
            temperature: None,
            max_output_tokens: None,
            retry_policy: RetryPolicy::default(),
            tool_search: None,
            telemetry: None,
        }
    }

    /// Register a tool, panicking on a duplicate name against this agent's
    /// own store. Call before the agent is wrapped in an `Arc` and handed
    /// to a `Handoff` or `AgenticLoop`.
    ///
    /// # Panics
    ///
    /// Panics if a tool with this name is already registered on this
    /// agent — a programmer error in wiring, not a runtime condition.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools
            .register(tool)
            .expect("duplicate tool name registered on agent");
        self
    }

    /// Append a skill section, merged into the system prompt after
    /// `instructions`.
    #[must_use]
    pub fn with_skill_section(mut self, section: impl Into<String>) -> Self {
        self.skill_sections.push(section.into());
        self
    }

    /// Declare a handoff target.
    #[must_use]
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoffs.push(handoff);
        self
    }

    /// Add an input guardrail, run once before the first Responder call.
    #[must_use]
    pub fn with_input_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    /// Add an output guardrail, run once the loop would otherwise terminate.
    #[must_use]
    pub fn with_output_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.output_guardrails.push(guardrail);
        self
    }

    /// Override the default turn budget.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Override the token budget the window strategy reduces history to.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Require the final assistant text to parse against a JSON schema.
    #[must_use]
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    /// Override the sampling temperature sent to the Responder.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap generated output tokens per Responder call.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Override the default Responder retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Narrow the tool schemas advertised per call via a
    /// [`ToolSearchStrategy`]; without one, every registered tool is
    /// advertised on every call ([`AllTools`]).
    #[must_use]
    pub fn with_tool_search(mut self, strategy: Arc<dyn ToolSearchStrategy>) -> Self {
        self.tool_search = Some(strategy);
        self
    }

    /// Publish a [`agentic_telemetry::TelemetryEvent`] around each of this
    /// agent's turns, Responder calls, and tool calls on `bus`.
    #[must_use]
    pub fn with_telemetry(mut self, bus: Arc<TelemetryBus>) -> Self {
        self.telemetry = Some(bus);
        self
    }

    /// Agent name, used in telemetry and as the `targetAgent` other agents'
    /// handoffs must name to select this one.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The system prompt: `instructions`, skill sections, then one line per
    /// declared handoff naming its target and rationale.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut sections = vec![self.instructions.clone()];
        sections.extend(self.skill_sections.iter().cloned());
        if !self.handoffs.is_empty() {
            let mut directive = String::from("You may hand off the conversation to:\n");
            for handoff in &self.handoffs {
                directive.push_str(&format!(
                    "- {}: {}\n",
                    handoff.target_name(),
                    handoff.description()
                ));
            }
            sections.push(directive);
        }
        sections.join("\n\n")
    }

    pub(crate) fn tools(&self) -> &ToolStore {
        &self.tools
    }

    /// Look up a declared handoff by target name.
    #[must_use]
    pub fn find_handoff(&self, target_agent: &str) -> Option<&Handoff> {
        self.handoffs
            .iter()
            .find(|h| h.target_name() == target_agent)
    }

    pub(crate) fn input_guardrails(&self) -> &[Arc<dyn Guardrail>] {
        &self.input_guardrails
    }

    pub(crate) fn output_guardrails(&self) -> &[Arc<dyn Guardrail>] {
        &self.output_guardrails
    }

    pub(crate) fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub(crate) fn window_strategy(&self) -> &Arc<dyn WindowStrategy> {
        &self.window_strategy
    }

    pub(crate) fn token_counter(&self) -> &Arc<dyn TokenCounter> {
        &self.token_counter
    }

    pub(crate) fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub(crate) fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    pub(crate) fn response_format(&self) -> &ResponseFormat {
        &self.response_format
    }

    pub(crate) fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub(crate) fn max_output_tokens(&self) -> Option<usize> {
        self.max_output_tokens
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub(crate) fn telemetry(&self) -> Option<&Arc<TelemetryBus>> {
        self.telemetry.as_ref()
    }

    /// Schemas advertised for one call: every registered tool, narrowed by
    /// the tool-search strategy if one is configured.
    pub(crate) fn advertised_tool_schemas(&self, latest_user_text: Option<&str>) -> Vec<agentic_core::ToolSchema> {
        let schemas = self.tools.all_schemas();
        match &self.tool_search {
            Some(strategy) => strategy.filter(schemas, latest_user_text),
            None => AllTools.filter(schemas, latest_user_text),
        }
    }
}
