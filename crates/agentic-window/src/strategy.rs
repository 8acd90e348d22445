//! The [`WindowStrategy`] contract.

use agentic_core::InputItem;
use async_trait::async_trait;

use crate::token_counter::TokenCounter;

/// Reduces a [`agentic_core::Context`]'s history to a transient view that
/// fits a token budget, without mutating the underlying storage.
///
/// Grounded on `astralis_runtime::context::ContextManager`'s
/// `needs_summarization`/`summarize` split, generalized into a trait so the
/// agentic loop can swap strategies per `Agent` rather than hard-coding one.
#[async_trait]
pub trait WindowStrategy: Send + Sync {
    /// Produce a reduced view of `history` that fits within `max_tokens`,
    /// using `counter` to estimate costs. Never mutates `history`.
    async fn reduce(
        &self,
        history: &[InputItem],
        max_tokens: usize,
        counter: &dyn TokenCounter,
    ) -> Vec<InputItem>;
}
