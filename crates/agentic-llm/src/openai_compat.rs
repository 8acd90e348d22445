//! An OpenAI-compatible [`Responder`], for OpenAI itself, LM Studio,
//! vLLM, Ollama, and any other endpoint speaking the same wire format.

use async_stream::try_stream;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use agentic_core::{ContentPart, InputItem, MessageRole};

use crate::error::{LlmError, LlmResult};
use crate::responder::{Responder, StreamBox};
use crate::types::{LlmRequest, LlmResponse, ResponseOutputItem, ResponseStatus, StreamEvent, Usage};

const DEFAULT_LM_STUDIO_URL: &str = "http://localhost:1234/v1/chat/completions";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Responder backed by any endpoint implementing the `/v1/chat/completions`
/// wire format.
///
/// Grounded on `astrid_llm::openai_compat::OpenAiCompatProvider`: the same
/// constructor set (`lm_studio`, `openai`, `custom`) and the same SSE
/// chunk-accumulation loop for streaming, rewritten against this crate's
/// `LlmRequest`/`StreamEvent` shapes.
pub struct OpenAiCompatResponder {
    client: Client,
    model: String,
    max_tokens: usize,
    temperature: f64,
    base_url: String,
    api_key: Option<String>,
    max_context: usize,
}

impl OpenAiCompatResponder {
    /// LM Studio's default local endpoint, with no API key.
    #[must_use]
    pub fn lm_studio_with_model(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.7,
            base_url: DEFAULT_LM_STUDIO_URL.to_string(),
            api_key: None,
            max_context: 32_768,
        }
    }

    /// The `OpenAI` API.
    #[must_use]
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let max_context = match model.as_str() {
            m if m.contains("gpt-4o") || m.contains("gpt-4-turbo") => 128_000,
            m if m.contains("gpt-4-32k") => 32_768,
            m if m.contains("gpt-4") => 8_192,
            m if m.contains("gpt-3.5-turbo-16k") || m.contains("gpt-3.5-turbo") => 16_385,
            _ => 8_192,
        };
        Self {
            client: Client::new(),
            model,
            max_tokens: 4096,
            temperature: 0.7,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: Some(api_key.into()),
            max_context,
        }
    }

    /// A fully custom endpoint.
    #[must_use]
    pub fn custom(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.7,
            base_url: base_url.into(),
            api_key,
            max_context: 32_768,
        }
    }

    /// Override the per-call output token cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the reported max context length.
    #[must_use]
    pub fn with_max_context(mut self, max_context: usize) -> Self {
        self.max_context = max_context;
        self
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> Value {
        let mut messages = Vec::new();
        if !request.instructions.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": request.instructions,
            }));
        }
        for item in &request.items {
            messages.push(convert_item(item));
        }

        let temperature = request.temperature.unwrap_or(self.temperature);
        let max_tokens = request.max_output_tokens.unwrap_or(self.max_tokens);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "stream": stream,
        });

        if !request.tool_schemas.is_empty() {
            let tools: Vec<Value> = request
                .tool_schemas
                .iter()
                .map(|t| {
                    let mut parameters = t.schema.clone();
                    if let Some(obj) = parameters.as_object_mut() {
                        obj.entry("properties")
                            .or_insert_with(|| serde_json::json!({}));
                    }
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }

        body
    }

    fn is_local(&self) -> bool {
        self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1")
    }

    fn auth_header(&self) -> LlmResult<Option<reqwest::header::HeaderValue>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };
        let mut value = reqwest::header::HeaderValue::try_from(format!("Bearer {api_key}"))
            .map_err(|e| {
                LlmError::ApiRequestFailed {
                    status_code: None,
                    message: format!("invalid API key characters: {e}"),
                }
            })?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

fn convert_item(item: &InputItem) -> Value {
    match item {
        InputItem::Message { role, content } => {
            let role_str = match role {
                MessageRole::Developer | MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            if content.len() == 1 {
                if let ContentPart::Text { text } = &content[0] {
                    return serde_json::json!({ "role": role_str, "content": text });
                }
            }
            let parts: Vec<Value> = content
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                    ContentPart::Image { source, .. } => {
                        let url = match source {
                            agentic_core::ImageSource::Url(u) => u.clone(),
                            agentic_core::ImageSource::Base64(b) => {
                                format!("data:image/png;base64,{b}")
                            }
                        };
                        serde_json::json!({
                            "type": "image_url",
                            "image_url": { "url": url },
                        })
                    }
                })
                .collect();
            serde_json::json!({ "role": role_str, "content": parts })
        }
        InputItem::ToolCallOutput {
            call_id, payload, ..
        } => {
            serde_json::json!({
                "role": "tool",
                "tool_call_id": call_id,
                "content": payload.as_text(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    id: String,
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<StreamToolCallDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    index: u32,
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[async_trait]
impl Responder for OpenAiCompatResponder {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_context_length(&self) -> usize {
        self.max_context
    }

    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse> {
        if self.api_key.is_none() && !self.is_local() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai-compat".to_string(),
            });
        }

        let body = self.build_request(request, false);
        let mut req = self.client.post(&self.base_url).json(&body);
        if let Some(header) = self.auth_header()? {
            req = req.header("Authorization", header);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status = status_code, body = %body, "openai-compat request failed");
            return Err(LlmError::ApiRequestFailed {
                status_code: Some(status_code),
                message: body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let mut output = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            output.push(ResponseOutputItem::Message {
                role: MessageRole::Assistant,
                content: vec![ContentPart::Text { text }],
            });
        }
        for call in choice.message.tool_calls {
            output.push(ResponseOutputItem::ToolCall(agentic_core::ToolCall::new(
                call.id,
                call.function.name,
                call.function.arguments,
            )));
        }

        let status = match choice.finish_reason.as_deref() {
            Some("length") => ResponseStatus::Incomplete,
            Some(_) | None => ResponseStatus::Completed,
        };

        Ok(LlmResponse {
            id: completion.id,
            status,
            output,
            usage: completion
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
            model: completion.model,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> LlmResult<StreamBox> {
        if self.api_key.is_none() && !self.is_local() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai-compat".to_string(),
            });
        }

        let body = self.build_request(request, true);
        debug!(model = %self.model, base_url = %self.base_url, "starting openai-compat stream");

        let mut req = self.client.post(&self.base_url).json(&body);
        if let Some(header) = self.auth_header()? {
            req = req.header("Authorization", header);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiRequestFailed {
                status_code: Some(status_code),
                message: body,
            });
        }

        let stream = try_stream! {
            use futures::StreamExt;

            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut current_tool_call: Option<String> = None;

            while let Some(chunk) = bytes_stream.next().await {
                let chunk = chunk.map_err(|e| LlmError::StreamingError(e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(event_end) = buffer.find("\n\n") {
                    let event_data = buffer[..event_end].to_string();
                    let rest_start = event_end + 2;
                    buffer.drain(..rest_start);

                    for line in event_data.lines() {
                        let Some(data) = line.strip_prefix("data: ") else { continue };
                        if data.trim() == "[DONE]" {
                            if let Some(id) = current_tool_call.take() {
                                yield StreamEvent::ToolCallEnd { id };
                            }
                            yield StreamEvent::Done;
                            return;
                        }

                        let Ok(event) = serde_json::from_str::<StreamChunk>(data) else { continue };
                        let Some(choice) = event.choices.first() else { continue };

                        if let Some(content) = &choice.delta.content {
                            if !content.is_empty() {
                                yield StreamEvent::TextDelta(content.clone());
                            }
                        }

                        for tc in &choice.delta.tool_calls {
                            if let Some(function) = &tc.function {
                                if tc.id.is_some() || current_tool_call.is_none() {
                                    if let Some(prev) = current_tool_call.take() {
                                        yield StreamEvent::ToolCallEnd { id: prev };
                                    }
                                    let id = tc.id.clone().unwrap_or_else(|| format!("call_{}", tc.index));
                                    let name = function.name.clone().unwrap_or_default();
                                    yield StreamEvent::ToolCallStart { id: id.clone(), name };
                                    current_tool_call = Some(id);
                                }
                                if let Some(args) = &function.arguments {
                                    if let Some(id) = &current_tool_call {
                                        yield StreamEvent::ToolCallDelta {
                                            id: id.clone(),
                                            args_delta: args.clone(),
                                        };
                                    }
                                }
                            }
                        }

                        if let Some(reason) = &choice.finish_reason {
                            if let Some(id) = current_tool_call.take() {
                                yield StreamEvent::ToolCallEnd { id };
                            }
                            if let Some(usage) = &event.usage {
                                yield StreamEvent::Usage(Usage {
                                    input_tokens: usage.prompt_tokens,
                                    output_tokens: usage.completion_tokens,
                                });
                            }
                            if reason == "stop" || reason == "tool_calls" {
                                yield StreamEvent::Done;
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
