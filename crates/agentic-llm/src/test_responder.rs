//! A deterministic scripted [`Responder`], for agentic-loop and
//! agentic-plan tests that must not depend on a live LLM.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::error::{LlmError, LlmResult};
use crate::responder::{Responder, StreamBox};
use crate::types::{LlmRequest, LlmResponse, ResponseStatus, StreamEvent, Usage};

/// Replays a fixed queue of [`LlmResponse`]s, one per call, in order.
///
/// Grounded on `astrid_test::mocks::MockFrontend`'s queue-of-canned-replies
/// pattern, adapted from its `VecDeque<T>` + `Mutex` shape to the Responder
/// boundary. `complete` pops from the queue; `stream` does the same but
/// re-synthesizes the response as a flat sequence of `StreamEvent`s so
/// callers exercising the streaming path see identical content to the
/// non-streaming path.
pub struct TestResponder {
    model: String,
    max_context_length: usize,
    queue: Mutex<Vec<LlmResponse>>,
}

impl TestResponder {
    /// A responder with an empty queue; every call fails until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: "test-model".to_string(),
            max_context_length: 128_000,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Override the reported model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the reported max context length.
    #[must_use]
    pub fn with_max_context_length(mut self, max_context_length: usize) -> Self {
        self.max_context_length = max_context_length;
        self
    }

    /// Queue one response to be returned by the next call.
    #[must_use]
    pub fn with_response(self, response: LlmResponse) -> Self {
        self.queue.lock().expect("queue mutex poisoned").push(response);
        self
    }

    /// Queue several responses at once, in the order they'll be replayed.
    #[must_use]
    pub fn with_responses(self, responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        self.queue
            .lock()
            .expect("queue mutex poisoned")
            .extend(responses);
        self
    }

    fn pop(&self) -> LlmResult<LlmResponse> {
        let mut queue = self.queue.lock().expect("queue mutex poisoned");
        if queue.is_empty() {
            return Err(LlmError::InvalidResponse(
                "TestResponder queue exhausted".to_string(),
            ));
        }
        Ok(queue.remove(0))
    }
}

impl Default for TestResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for TestResponder {
    fn name(&self) -> &str {
        "test"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_context_length(&self) -> usize {
        self.max_context_length
    }

    async fn stream(&self, _request: &LlmRequest) -> LlmResult<StreamBox> {
        let response = self.pop()?;
        let mut events = Vec::new();
        for item in &response.output {
            match item {
                crate::types::ResponseOutputItem::Message { content, .. } => {
                    for part in content {
                        if let agentic_core::ContentPart::Text { text } = part {
                            events.push(Ok(StreamEvent::TextDelta(text.clone())));
                        }
                    }
                }
                crate::types::ResponseOutputItem::ToolCall(call) => {
                    events.push(Ok(StreamEvent::ToolCallStart {
                        id: call.call_id.clone(),
                        name: call.tool_name.clone(),
                    }));
                    events.push(Ok(StreamEvent::ToolCallDelta {
                        id: call.call_id.clone(),
                        args_delta: call.raw_arguments_json.clone(),
                    }));
                    events.push(Ok(StreamEvent::ToolCallEnd {
                        id: call.call_id.clone(),
                    }));
                }
                crate::types::ResponseOutputItem::Handoff(h) => {
                    events.push(Ok(StreamEvent::Handoff(h.clone())));
                }
            }
        }
        events.push(Ok(StreamEvent::Usage(response.usage)));
        events.push(Ok(StreamEvent::Done));
        Ok(Box::pin(stream::iter(events)))
    }

    async fn complete(&self, _request: &LlmRequest) -> LlmResult<LlmResponse> {
        self.pop()
    }
}

/// Build a minimal `Completed` text-only response, for tests that only
/// care about final text.
#[must_use]
pub fn text_response(text: impl Into<String>) -> LlmResponse {
    LlmResponse {
        id: "test-response".to_string(),
        status: ResponseStatus::Completed,
        output: vec![crate::types::ResponseOutputItem::Message {
            role: agentic_core::MessageRole::Assistant,
            content: vec![agentic_core::ContentPart::Text { text: text.into() }],
        }],
        usage: Usage::default(),
        model: "test-model".to_string(),
    }
}

/// Build a response requesting a single tool call, with no accompanying
/// text.
#[must_use]
pub fn tool_call_response(call_id: &str, tool_name: &str, raw_arguments_json: &str) -> LlmResponse {
    LlmResponse {
        id: "test-response".to_string(),
        status: ResponseStatus::Completed,
        output: vec![crate::types::ResponseOutputItem::ToolCall(
            agentic_core::ToolCall::new(call_id, tool_name, raw_arguments_json),
        )],
        usage: Usage::default(),
        model: "test-model".to_string(),
    }
}

/// Build a response requesting several tool calls at once, in the given
/// order, with no accompanying text.
#[must_use]
pub fn multi_tool_call_response(calls: &[(&str, &str, &str)]) -> LlmResponse {
    LlmResponse {
        id: "test-response".to_string(),
        status: ResponseStatus::Completed,
        output: calls
            .iter()
            .map(|(call_id, tool_name, raw_arguments_json)| {
                crate::types::ResponseOutputItem::ToolCall(agentic_core::ToolCall::new(
                    *call_id,
                    *tool_name,
                    *raw_arguments_json,
                ))
            })
            .collect(),
        usage: Usage::default(),
        model: "test-model".to_string(),
    }
}

/// Build a response requesting a handoff to `target_agent`, with no
/// accompanying text.
#[must_use]
pub fn handoff_response(target_agent: &str, input: Option<&str>) -> LlmResponse {
    LlmResponse {
        id: "test-response".to_string(),
        status: ResponseStatus::Completed,
        output: vec![crate::types::ResponseOutputItem::Handoff(
            crate::types::HandoffCall {
                target_agent: target_agent.to_string(),
                input: input.map(str::to_string),
            },
        )],
        usage: Usage::default(),
        model: "test-model".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_replays_queued_responses_in_order() {
        let responder = TestResponder::new()
            .with_response(text_response("first"))
            .with_response(text_response("second"));
        let request = LlmRequest::simple("instructions", vec![]);
        let first = responder.complete(&request).await.unwrap();
        let second = responder.complete(&request).await.unwrap();
        assert_eq!(first.text(), "first");
        assert_eq!(second.text(), "second");
    }

    #[tokio::test]
    async fn complete_on_empty_queue_errors() {
        let responder = TestResponder::new();
        let request = LlmRequest::simple("instructions", vec![]);
        assert!(responder.complete(&request).await.is_err());
    }

    #[tokio::test]
    async fn stream_replays_text_as_deltas() {
        use futures::StreamExt;
        let responder = TestResponder::new().with_response(text_response("hi"));
        let request = LlmRequest::simple("instructions", vec![]);
        let mut stream = responder.stream(&request).await.unwrap();
        let mut texts = Vec::new();
        while let Some(event) = stream.next().await {
            if let Ok(StreamEvent::TextDelta(t)) = event {
                texts.push(t);
            }
        }
        assert_eq!(texts.join(""), "hi");
    }
}
