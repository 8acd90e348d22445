//! The [`Summarization`] [`WindowStrategy`].

use std::sync::Arc;

use agentic_core::InputItem;
use agentic_llm::{LlmRequest, Responder};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::sliding_window::SlidingWindow;
use crate::strategy::WindowStrategy;
use crate::token_counter::TokenCounter;

const DEFAULT_KEEP_RECENT: usize = 5;

const SUMMARIZATION_FAILED_PLACEHOLDER: &str = "[Summarization failed — context truncated]";

/// Keeps the last `K` items verbatim and replaces everything older with a
/// single synthetic developer message summarizing them, generated by a
/// (typically cheaper) Responder.
///
/// Grounded on `astralis_runtime::context::ContextManager::summarize`: the
/// same "drain the old prefix, ask the LLM for a summary, reinsert as one
/// message" shape, generalized from `AgentSession`'s concrete message
/// buffer to the `WindowStrategy` trait. Falls back to
/// [`SlidingWindow`] when the recent items alone don't fit, and to a
/// placeholder message when the summarization call itself fails.
pub struct Summarization<R: Responder> {
    responder: Arc<R>,
    keep_recent: usize,
    fallback: SlidingWindow,
}

impl<R: Responder> Summarization<R> {
    /// Summarize with the default `keep_recent = 5`.
    #[must_use]
    pub fn new(responder: Arc<R>) -> Self {
        Self {
            responder,
            keep_recent: DEFAULT_KEEP_RECENT,
            fallback: SlidingWindow::new(),
        }
    }

    /// Override how many of the newest items are kept verbatim.
    #[must_use]
    pub fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }

    fn format_for_summary(items: &[InputItem]) -> String {
        items
            .iter()
            .map(|item| format!("{:?}: {}", role_label(item), item.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn role_label(item: &InputItem) -> &'static str {
    match item {
        InputItem::Message { role, .. } => match role {
            agentic_core::MessageRole::Developer => "developer",
            agentic_core::MessageRole::User => "user",
            agentic_core::MessageRole::Assistant => "assistant",
            agentic_core::MessageRole::System => "system",
        },
        InputItem::ToolCallOutput { .. } => "tool",
    }
}

#[async_trait]
impl<R: Responder> WindowStrategy for Summarization<R> {
    async fn reduce(
        &self,
        history: &[InputItem],
        max_tokens: usize,
        counter: &dyn TokenCounter,
    ) -> Vec<InputItem> {
        if history.len() <= self.keep_recent {
            return history.to_vec();
        }

        let split_at = history.len() - self.keep_recent;
        let (to_summarize, recent) = history.split_at(split_at);

        let recent_tokens = counter.count_history(recent);
        if recent_tokens > max_tokens {
            warn!(
                recent_tokens,
                max_tokens, "recent items alone exceed the token budget; falling back to sliding window"
            );
            return self.fallback.reduce(history, max_tokens, counter).await;
        }

        let prompt = format!(
            "Summarize the following conversation, preserving key facts, decisions, \
             and context that would be important for continuing it:\n\n{}",
            Self::format_for_summary(to_summarize)
        );
        let request = LlmRequest::simple(String::new(), vec![InputItem::user(prompt)]);

        let summary_text = match self.responder.complete(&request).await {
            Ok(response) if !response.text().is_empty() => response.text(),
            Ok(_) => {
                warn!("summarization responder returned empty text; falling back");
                return self.fallback.reduce(history, max_tokens, counter).await;
            }
            Err(error) => {
                warn!(%error, "summarization responder call failed; falling back");
                let mut reduced = vec![InputItem::developer(SUMMARIZATION_FAILED_PLACEHOLDER)];
                reduced.extend(recent.iter().cloned());
                return reduced;
            }
        };

        debug!(summary_len = summary_text.len(), "generated context summary");
        let summary_item =
            InputItem::developer(format!("[Previous conversation summary]\n{summary_text}"));

        let mut reduced = Vec::with_capacity(1 + recent.len());
        reduced.push(summary_item);
        reduced.extend(recent.iter().cloned());

        if counter.count_history(&reduced) > max_tokens {
            warn!("summary plus recent items still exceed budget; falling back to sliding window");
            return self.fallback.reduce(&reduced, max_tokens, counter).await;
        }

        reduced
    }
}
