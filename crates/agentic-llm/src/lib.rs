//! The Responder contract: the agentic runtime's only LLM boundary.
//!
//! Defines [`Responder`], the request/response/event types it
//! exchanges, a deterministic [`test_responder::TestResponder`] for tests
//! that must not touch a live model, and an
//! [`openai_compat::OpenAiCompatResponder`] adapter for OpenAI and any
//! OpenAI-wire-compatible endpoint (LM Studio, vLLM, Ollama).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod openai_compat;
pub mod prelude;
pub mod responder;
pub mod test_responder;
pub mod types;

pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatResponder;
pub use responder::{Responder, StreamBox};
pub use test_responder::{
    handoff_response, multi_tool_call_response, text_response, tool_call_response, TestResponder,
};
pub use types::{
    HandoffCall, LlmRequest, LlmResponse, ResponseFormat, ResponseOutputItem, ResponseStatus,
    StreamEvent, TraceMetadata, Usage,
};
