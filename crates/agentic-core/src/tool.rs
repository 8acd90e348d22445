//! The [`Tool`] contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::input::ToolCallOutputPayload;

/// A locally-executable capability advertised to the LLM.
///
/// Mirrors `astrid_tools::BuiltinTool`'s trait shape (name,
/// description, schema, `execute`) but adds the `strict`/`needsConfirmation`
/// flags this runtime requires and returns a typed [`ToolOutput`] rather than a
/// bare `String`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within one [`crate::ToolStore`]. Non-empty.
    fn name(&self) -> &str;

    /// Human-readable description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON-schema object describing the tool's parameters.
    fn schema(&self) -> Value;

    /// When `true`, the loop validates `rawArgumentsJson` against
    /// [`Tool::schema`] before invoking.
    fn strict(&self) -> bool {
        false
    }

    /// When `true`, the loop pauses for human approval before invoking
    ///.
    fn needs_confirmation(&self) -> bool {
        false
    }

    /// Execute the tool against already-parsed raw JSON arguments.
    async fn invoke(&self, input: Value) -> ToolOutput;
}

/// A tool call emitted by the LLM.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Unique within one `Response`.
    pub call_id: String,
    /// The tool being invoked.
    pub tool_name: String,
    /// Raw, unparsed arguments JSON exactly as emitted by the LLM.
    pub raw_arguments_json: String,
}

impl ToolCall {
    /// Construct a new tool call.
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            raw_arguments_json: raw_arguments_json.into(),
        }
    }
}

/// Payload shape returned by [`Tool::invoke`], independent of the `Context`
/// representation ([`crate::input::ToolCallOutputPayload`]) so that tool
/// authors never depend on `agentic-core`'s context wiring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ToolOutputPayload {
    /// Plain text.
    Text(String),
    /// Base64 or URL image payload, as an opaque string.
    Image(String),
    /// Structured JSON.
    StructuredJson(Value),
}

impl ToolOutputPayload {
    /// Render the payload as text, the representation used when a plan
    /// step's output is referenced via `$ref:stepId` without a field path.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(t) => t.clone(),
            Self::Image(s) => s.clone(),
            Self::StructuredJson(v) => v.to_string(),
        }
    }

    /// Parse this payload as JSON, for `$ref:stepId.a.b` field extraction.
    /// Returns `None` if the payload is not JSON-parseable.
    #[must_use]
    pub fn as_json(&self) -> Option<Value> {
        match self {
            Self::StructuredJson(v) => Some(v.clone()),
            Self::Text(t) => serde_json::from_str(t).ok(),
            Self::Image(_) => None,
        }
    }
}

/// The result of invoking a [`Tool`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolOutput {
    /// The result payload.
    pub content: ToolOutputPayload,
    /// `true` if the tool call failed.
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: ToolOutputPayload::Text(content.into()),
            is_error: false,
        }
    }

    /// A successful structured-JSON result.
    #[must_use]
    pub fn json(content: Value) -> Self {
        Self {
            content: ToolOutputPayload::StructuredJson(content),
            is_error: false,
        }
    }

    /// An error result carrying a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: ToolOutputPayload::Text(message.into()),
            is_error: true,
        }
    }

    /// Convert into the `Context`-facing payload representation, used by
    /// the loop when appending a `ToolCallOutput` item.
    #[must_use]
    pub fn into_context_payload(self) -> ToolCallOutputPayload {
        match self.content {
            ToolOutputPayload::Text(t) => ToolCallOutputPayload::Text(t),
            ToolOutputPayload::Image(s) => ToolCallOutputPayload::Image {
                source: crate::input::ImageSource::Base64(s),
            },
            ToolOutputPayload::StructuredJson(v) => ToolCallOutputPayload::StructuredJson(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_as_json_parses_when_valid() {
        let payload = ToolOutputPayload::Text("{\"a\":1}".to_string());
        assert_eq!(payload.as_json(), Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn text_payload_as_json_none_when_invalid() {
        let payload = ToolOutputPayload::Text("not json".to_string());
        assert_eq!(payload.as_json(), None);
    }

    #[test]
    fn error_output_sets_is_error() {
        let out = ToolOutput::error("boom");
        assert!(out.is_error);
        assert_eq!(out.content.as_text(), "boom");
    }
}
