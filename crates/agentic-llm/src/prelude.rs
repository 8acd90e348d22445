//! Convenience re-exports for crates consuming `agentic-llm`.

pub use crate::error::{LlmError, LlmResult};
pub use crate::openai_compat::OpenAiCompatResponder;
pub use crate::responder::{Responder, StreamBox};
pub use crate::test_responder::TestResponder;
pub use crate::types::{
    HandoffCall, LlmRequest, LlmResponse, ResponseFormat, ResponseOutputItem, ResponseStatus,
    StreamEvent, TraceMetadata, Usage,
};
