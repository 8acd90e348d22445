//! The [`SlidingWindow`] [`WindowStrategy`].

use agentic_core::InputItem;
use async_trait::async_trait;

use crate::strategy::WindowStrategy;
use crate::token_counter::TokenCounter;

/// Keeps the newest items that fit, optionally anchoring a preserved prefix
/// of leading developer messages.
///
/// Grounded on `astralis_runtime::context::ContextManager::keep_recent_count`
/// — a fixed-count tail-keep — generalized to token-budgeted
/// walk (a message's size varies, so a fixed count can't guarantee the
/// budget is respected).
pub struct SlidingWindow {
    preserve_developer_messages: bool,
}

impl SlidingWindow {
    /// A sliding window that does not special-case any prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            preserve_developer_messages: true,
        }
    }

    /// Control whether a leading run of developer messages is reserved
    /// before the token budget is spent on the suffix.
    #[must_use]
    pub fn with_preserve_developer_messages(mut self, preserve: bool) -> Self {
        self.preserve_developer_messages = preserve;
        self
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowStrategy for SlidingWindow {
    async fn reduce(
        &self,
        history: &[InputItem],
        max_tokens: usize,
        counter: &dyn TokenCounter,
    ) -> Vec<InputItem> {
        if counter.count_history(history) <= max_tokens {
            return history.to_vec();
        }

        let prefix_len = if self.preserve_developer_messages {
            history
                .iter()
                .take_while(|item| item.is_developer_message())
                .count()
        } else {
            0
        };
        let (prefix, suffix) = history.split_at(prefix_len);

        let prefix_tokens: usize = prefix.iter().map(|item| counter.count_item(item)).sum();
        let mut budget = max_tokens.saturating_sub(prefix_tokens);

        let mut collected: Vec<&InputItem> = Vec::new();
        for item in suffix.iter().rev() {
            let cost = counter.count_item(item);
            if cost > budget {
                break;
            }
            budget -= cost;
            collected.push(item);
        }
        collected.reverse();

        prefix
            .iter()
            .cloned()
            .chain(collected.into_iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_counter::HeuristicTokenCounter;
    use agentic_core::MessageRole;

    #[tokio::test]
    async fn history_under_budget_is_unchanged() {
        let window = SlidingWindow::new();
        let counter = HeuristicTokenCounter;
        let history = vec![InputItem::user("hi")];
        let reduced = window.reduce(&history, 1000, &counter).await;
        assert_eq!(reduced.len(), 1);
    }

    #[tokio::test]
    async fn keeps_most_recent_items_under_budget() {
        let window = SlidingWindow::new().with_preserve_developer_messages(false);
        let counter = HeuristicTokenCounter;
        let history: Vec<InputItem> = (0..10)
            .map(|i| InputItem::user(format!("{}", "x".repeat(1000)) + &i.to_string()))
            .collect();
        let reduced = window.reduce(&history, 500, &counter).await;
        assert!(counter.count_history(&reduced) <= 500);
        assert_eq!(
            reduced.last().map(InputItem::text),
            history.last().map(InputItem::text)
        );
    }

    #[tokio::test]
    async fn preserves_leading_developer_messages() {
        let window = SlidingWindow::new();
        let counter = HeuristicTokenCounter;
        let mut history = vec![InputItem::text_message(
            MessageRole::Developer,
            "system prompt",
        )];
        for _ in 0..10 {
            history.push(InputItem::user("x".repeat(1000)));
        }
        let reduced = window.reduce(&history, 500, &counter).await;
        assert!(reduced[0].is_developer_message());
    }
}
