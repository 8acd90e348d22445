//! The sliding-window budget scenario, exercised against
//! `agentic_core::InputItem` directly rather than a strategy unit test.

use agentic_core::{InputItem, MessageRole};
use agentic_window::{HeuristicTokenCounter, SlidingWindow, TokenCounter, WindowStrategy};

#[tokio::test]
async fn ten_thousand_char_history_is_trimmed_to_budget_and_keeps_the_tail() {
    let window = SlidingWindow::new();
    let counter = HeuristicTokenCounter;

    let mut history = vec![InputItem::text_message(MessageRole::Developer, "system prompt")];
    for i in 0..10 {
        history.push(InputItem::user(format!("{}-{}", "x".repeat(1000), i)));
    }

    let reduced = window.reduce(&history, 500, &counter).await;

    assert!(counter.count_history(&reduced) <= 500);
    assert!(reduced[0].is_developer_message());
    assert_eq!(reduced.last().map(InputItem::text), history.last().map(InputItem::text));
}

#[tokio::test]
async fn disabling_developer_preservation_lets_the_prefix_be_evicted() {
    let window = SlidingWindow::new().with_preserve_developer_messages(false);
    let counter = HeuristicTokenCounter;

    let mut history = vec![InputItem::text_message(MessageRole::Developer, "system prompt")];
    for i in 0..10 {
        history.push(InputItem::user(format!("{}-{}", "x".repeat(1000), i)));
    }

    let reduced = window.reduce(&history, 500, &counter).await;

    assert!(!reduced[0].is_developer_message());
}
