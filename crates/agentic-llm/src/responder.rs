//! The [`Responder`] trait: the LLM boundary.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::LlmResult;
use crate::types::{LlmRequest, LlmResponse, StreamEvent};

/// A boxed stream of incremental events from a streaming call.
pub type StreamBox = Pin<Box<dyn Stream<Item = LlmResult<StreamEvent>> + Send>>;

/// Transport-opaque adapter to an LLM backend.
///
/// Grounded on `astrid_llm::provider::LlmProvider`: the same
/// streaming-vs-non-streaming split, the same blanket `Box<dyn Responder>`
/// impl so a boxed trait object can itself be passed wherever `R: Responder`
/// is required. Requests and responses are the
/// single `LlmRequest`/`LlmResponse` struct pair rather than
/// positional `(messages, tools, system)` arguments, since those three
/// concerns plus response-format/metadata/trace all travel together here.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Provider name, used in telemetry attributes and error messages.
    fn name(&self) -> &str;

    /// The model this Responder is configured to call.
    fn model(&self) -> &str;

    /// The model's context window, in tokens, for window-budget planning.
    fn max_context_length(&self) -> usize;

    /// Issue a streaming call, yielding incremental events terminated by
    /// `StreamEvent::Done` or `StreamEvent::Error`.
    async fn stream(&self, request: &LlmRequest) -> LlmResult<StreamBox>;

    /// Issue a non-streaming call, returning the full response at once.
    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse>;
}

#[async_trait]
impl Responder for Box<dyn Responder> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn max_context_length(&self) -> usize {
        (**self).max_context_length()
    }

    async fn stream(&self, request: &LlmRequest) -> LlmResult<StreamBox> {
        (**self).stream(request).await
    }

    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse> {
        (**self).complete(request).await
    }
}
