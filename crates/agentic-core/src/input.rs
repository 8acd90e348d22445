//! Conversation item types.

use serde::{Deserialize, Serialize};

/// One item in a [`crate::Context`]'s ordered history.
///
/// A tagged union, preferring sum types over
/// class hierarchies (see `astrid-llm::types::MessageContent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputItem {
    /// A message authored by one of the four roles.
    Message {
        /// Who authored the message.
        role: MessageRole,
        /// The message body, as one or more content parts.
        content: Vec<ContentPart>,
    },
    /// The output of a single tool call, appended after dispatch.
    ToolCallOutput {
        /// The `callId` this output answers.
        call_id: String,
        /// The tool's result payload.
        payload: ToolCallOutputPayload,
        /// Whether the tool call failed.
        is_error: bool,
    },
}

impl InputItem {
    /// Construct a single-part text message.
    #[must_use]
    pub fn text_message(role: MessageRole, text: impl Into<String>) -> Self {
        Self::Message {
            role,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Construct a user text message — the common case in tests and
    /// examples.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::User, text)
    }

    /// Construct a developer (system instruction) text message.
    #[must_use]
    pub fn developer(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::Developer, text)
    }

    /// Construct an assistant text message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::Assistant, text)
    }

    /// Construct a successful tool call output.
    #[must_use]
    pub fn tool_output(call_id: impl Into<String>, payload: ToolCallOutputPayload) -> Self {
        Self::ToolCallOutput {
            call_id: call_id.into(),
            payload,
            is_error: false,
        }
    }

    /// Construct an error tool call output.
    #[must_use]
    pub fn tool_error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolCallOutput {
            call_id: call_id.into(),
            payload: ToolCallOutputPayload::Text(message.into()),
            is_error: true,
        }
    }

    /// `true` if this item is a developer-role message, used by
    /// `agentic-window`'s sliding window to identify the preserved prefix.
    #[must_use]
    pub fn is_developer_message(&self) -> bool {
        matches!(
            self,
            Self::Message {
                role: MessageRole::Developer,
                ..
            }
        )
    }

    /// Concatenated text of all `Text` parts, empty for non-text content.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Message { content, .. } => content
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join(""),
            Self::ToolCallOutput {
                payload: ToolCallOutputPayload::Text(t),
                ..
            } => t.clone(),
            Self::ToolCallOutput {
                payload: ToolCallOutputPayload::StructuredJson(v),
                ..
            } => v.to_string(),
            Self::ToolCallOutput { .. } => String::new(),
        }
    }
}

/// The role a [`InputItem::Message`] was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction, conventionally the first item in a `Context`.
    Developer,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Rare: an injected system-level message distinct from the developer
    /// instruction.
    System,
}

/// One part of a (possibly multi-part) message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image, referenced by URL or inlined as base64.
    Image {
        /// URL or base64-encoded payload.
        source: ImageSource,
        /// Requested rendering detail, which drives token estimation in
        /// `agentic-window`.
        detail: ImageDetail,
    },
}

impl ContentPart {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Where image bytes come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ImageSource {
    /// A remote URL.
    Url(String),
    /// Inline base64-encoded bytes.
    Base64(String),
}

/// Requested image rendering fidelity token table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Let the provider choose.
    Auto,
    /// Cheaper, coarser detail.
    Low,
    /// Full detail.
    High,
}

/// The payload of a [`InputItem::ToolCallOutput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ToolCallOutputPayload {
    /// Plain text result.
    Text(String),
    /// An image result.
    Image {
        /// URL or base64-encoded payload.
        source: ImageSource,
    },
    /// A structured JSON result.
    StructuredJson(serde_json::Value),
}
