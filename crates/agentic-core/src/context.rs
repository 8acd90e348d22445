//! The conversation [`Context`].

use std::collections::HashMap;

use serde_json::Value;

use crate::input::InputItem;

/// Ordered conversation history plus custom key-value state.
///
/// Items are never removed or rewritten once appended — `agentic-window`
/// produces a transient reduced *view* for each LLM call but never mutates
/// storage. A `Context` is single-writer for the
/// duration of one `AgenticLoop` invocation; callers must not mutate it
/// concurrently.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Context {
    items: Vec<InputItem>,
    state: HashMap<String, Value>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context seeded with the given items, in order.
    #[must_use]
    pub fn from_items(items: Vec<InputItem>) -> Self {
        Self {
            items,
            state: HashMap::new(),
        }
    }

    /// Append one item, preserving insertion order.
    pub fn push(&mut self, item: InputItem) {
        self.items.push(item);
    }

    /// Append several items, preserving the order given (used when
    /// appending a turn's tool-call outputs in LLM-emitted order).
    pub fn extend(&mut self, items: impl IntoIterator<Item = InputItem>) {
        self.items.extend(items);
    }

    /// The full, untruncated history.
    #[must_use]
    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    /// The most recent item, if any.
    #[must_use]
    pub fn last(&self) -> Option<&InputItem> {
        self.items.last()
    }

    /// The most recent `InputItem::Message{role: User, ..}`'s text, used by
    /// the first-turn input guardrail and by tool-search filtering.
    #[must_use]
    pub fn latest_user_text(&self) -> Option<String> {
        self.items.iter().rev().find_map(|item| match item {
            InputItem::Message {
                role: crate::input::MessageRole::User,
                ..
            } => Some(item.text()),
            _ => None,
        })
    }

    /// Read a custom state entry.
    #[must_use]
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Set a custom state entry; entries survive the loop's lifetime and
    /// may be propagated to sub-agents per explicit config.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// All custom state, for propagation to a sub-agent's `Context`.
    #[must_use]
    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    /// Number of items currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if no items have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
