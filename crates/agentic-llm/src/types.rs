//! Request/response shapes for the Responder boundary.

use agentic_core::{ContentPart, InputItem, MessageRole, ToolCall, ToolSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What shape the final assistant text must take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Unconstrained text.
    Free,
    /// Must parse against the given JSON schema.
    Structured {
        /// The JSON schema the final text is validated against.
        schema: Value,
    },
}

/// Trace context propagated to the telemetry span wrapping one Responder
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// 32 lower-case hex chars.
    pub trace_id: String,
    /// The enclosing span, usually the loop's per-turn span.
    pub parent_span_id: Option<String>,
}

/// A request sent to a [`crate::Responder`].
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System instructions: Agent instructions + merged skill sections +
    /// handoff directives, already composed by the caller.
    pub instructions: String,
    /// The window-reduced conversation view.
    pub items: Vec<InputItem>,
    /// Tool schemas advertised for this call, already filtered by any
    /// tool-search strategy.
    pub tool_schemas: Vec<ToolSchema>,
    /// Required shape of the final assistant text.
    pub response_format: ResponseFormat,
    /// Sampling temperature, if the caller wants to override the provider
    /// default.
    pub temperature: Option<f64>,
    /// Cap on generated tokens.
    pub max_output_tokens: Option<usize>,
    /// Opaque caller metadata forwarded to the provider where supported.
    pub metadata: Option<Value>,
    /// Trace propagation for this call's span.
    pub trace_metadata: Option<TraceMetadata>,
}

impl LlmRequest {
    /// A request with no tools and free-form output, the common case for
    /// one-off completions (e.g. context summarization).
    #[must_use]
    pub fn simple(instructions: impl Into<String>, items: Vec<InputItem>) -> Self {
        Self {
            instructions: instructions.into(),
            items,
            tool_schemas: Vec::new(),
            response_format: ResponseFormat::Free,
            temperature: None,
            max_output_tokens: None,
            metadata: None,
            trace_metadata: None,
        }
    }
}

/// Outcome status of a completed Responder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The model produced a full response.
    Completed,
    /// The model stopped early (e.g. hit `maxOutputTokens`).
    Incomplete,
    /// The provider reported a failure for this call.
    Failed,
}

/// A declarative request, emitted by the LLM, to transfer the conversation
/// to a different Agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffCall {
    /// Name of the target agent, as advertised in the Agent's `handoffs`.
    pub target_agent: String,
    /// Optional free-text rationale or payload for the target agent.
    pub input: Option<String>,
}

/// One item of a Responder's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseOutputItem {
    /// Assistant-authored text or multi-part content.
    Message {
        /// Always `MessageRole::Assistant` for Responder output; carried as
        /// a field rather than assumed so callers pattern-match uniformly.
        role: MessageRole,
        /// The message body.
        content: Vec<ContentPart>,
    },
    /// A request to invoke a locally-registered tool.
    ToolCall(ToolCall),
    /// A request to transfer control to another Agent.
    Handoff(HandoffCall),
}

/// Token accounting for one Responder call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the input (instructions + items + tool schemas).
    pub input_tokens: u64,
    /// Tokens consumed by the generated output.
    pub output_tokens: u64,
}

impl Usage {
    /// Sum of input and output tokens.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A completed Responder call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Provider-assigned identifier for this call.
    pub id: String,
    /// Completion status.
    pub status: ResponseStatus,
    /// Ordered output items.
    pub output: Vec<ResponseOutputItem>,
    /// Token accounting.
    pub usage: Usage,
    /// The model that actually served the request.
    pub model: String,
}

impl LlmResponse {
    /// Concatenated text of every `Message` output item.
    #[must_use]
    pub fn text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponseOutputItem::Message { content, .. } => Some(
                    content
                        .iter()
                        .filter_map(|part| match part {
                            ContentPart::Text { text } => Some(text.as_str()),
                            ContentPart::Image { .. } => None,
                        })
                        .collect::<Vec<_>>()
                        .join(""),
                ),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Every tool call requested by this response, in emitted order.
    #[must_use]
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponseOutputItem::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// The handoff this response requested, if any: at most
    /// one is meaningful per response; if the model emits more than one,
    /// the first wins and the rest are ignored by the loop.
    #[must_use]
    pub fn handoff(&self) -> Option<&HandoffCall> {
        self.output.iter().find_map(|item| match item {
            ResponseOutputItem::Handoff(h) => Some(h),
            _ => None,
        })
    }

    /// `true` if this response requested at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.output
            .iter()
            .any(|item| matches!(item, ResponseOutputItem::ToolCall(_)))
    }
}

/// A single incremental event from a streaming Responder call.
///
/// Mirrors `astrid_llm::types::StreamEvent`'s shape: deltas are accumulated
/// by the caller (the agentic loop) into a final [`LlmResponse`]-equivalent
/// once `Done` arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// An incremental chunk of assistant text.
    TextDelta(String),
    /// A tool call has begun; arguments arrive via subsequent `ToolCallDelta`s.
    ToolCallStart {
        /// The call's id, stable for the rest of this stream.
        id: String,
        /// The tool being invoked.
        name: String,
    },
    /// An incremental chunk of a tool call's arguments JSON.
    ToolCallDelta {
        /// Which call this delta belongs to.
        id: String,
        /// The incremental text to append to that call's raw arguments.
        args_delta: String,
    },
    /// A tool call's arguments are complete.
    ToolCallEnd {
        /// The completed call's id.
        id: String,
    },
    /// A request to hand off to another agent, emitted whole (handoffs are
    /// not incrementally streamed).
    Handoff(HandoffCall),
    /// An incremental chunk of hidden reasoning/thinking text, if the model
    /// exposes it.
    ReasoningDelta(String),
    /// Final usage accounting, emitted once near the end of the stream.
    Usage(Usage),
    /// The stream completed normally.
    Done,
    /// The stream failed; no further events follow.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_concatenates_message_items() {
        let response = LlmResponse {
            id: "r1".into(),
            status: ResponseStatus::Completed,
            output: vec![ResponseOutputItem::Message {
                role: MessageRole::Assistant,
                content: vec![ContentPart::Text {
                    text: "hello".into(),
                }],
            }],
            usage: Usage::default(),
            model: "test-model".into(),
        };
        assert_eq!(response.text(), "hello");
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn response_tool_calls_filters_non_tool_items() {
        let response = LlmResponse {
            id: "r1".into(),
            status: ResponseStatus::Completed,
            output: vec![
                ResponseOutputItem::Message {
                    role: MessageRole::Assistant,
                    content: vec![],
                },
                ResponseOutputItem::ToolCall(ToolCall::new("c1", "echo", "{}")),
            ],
            usage: Usage::default(),
            model: "test-model".into(),
        };
        assert_eq!(response.tool_calls().len(), 1);
        assert!(response.has_tool_calls());
    }

    #[test]
    fn usage_total_sums_both_fields() {
        let usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
        };
        assert_eq!(usage.total(), 15);
    }
}
