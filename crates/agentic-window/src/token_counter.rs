//! Stateless token estimation.

use agentic_core::{ContentPart, ImageDetail, InputItem};

/// Per-item bookkeeping overhead, in tokens, added on top of content tokens
/// to account for role/field wrapping in the wire format.
const MESSAGE_OVERHEAD: usize = 4;

/// Additional overhead for a tool-call-output item, which carries more
/// structure (`callId`, `isError`) than a plain message.
const TOOL_OUTPUT_OVERHEAD: usize = 10;

/// Fixed token costs per [`ImageDetail`] level, independent of actual image
/// dimensions (the core has no access to a decoder).
const IMAGE_TOKENS_AUTO: usize = 170;
const IMAGE_TOKENS_LOW: usize = 85;
const IMAGE_TOKENS_HIGH: usize = 765;

/// Estimates token counts for text, images, and whole [`InputItem`]s.
///
/// Grounded on the `len() / 4` heuristic
/// (`astrid_llm::provider::LlmProvider::count_tokens` and
/// `astralis_runtime::context`'s `t.len() / 4` inline estimate), extended
/// with fixed per-image and per-item overhead so a
/// [`crate::WindowStrategy`] can budget multi-part messages. Swappable:
/// downstream crates may supply a tokenizer-accurate counter instead, the
/// core only relies on non-negativity and additivity over items.
pub trait TokenCounter: Send + Sync {
    /// Estimate the token cost of a run of text.
    fn count_text(&self, text: &str) -> usize;

    /// Estimate the token cost of an image at the given detail level.
    fn count_image(&self, detail: ImageDetail) -> usize {
        match detail {
            ImageDetail::Auto => IMAGE_TOKENS_AUTO,
            ImageDetail::Low => IMAGE_TOKENS_LOW,
            ImageDetail::High => IMAGE_TOKENS_HIGH,
        }
    }

    /// Estimate the total token cost of one context item, including
    /// per-item overhead.
    fn count_item(&self, item: &InputItem) -> usize {
        match item {
            InputItem::Message { content, .. } => {
                let parts: usize = content
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => self.count_text(text),
                        ContentPart::Image { detail, .. } => self.count_image(*detail),
                    })
                    .sum();
                parts + MESSAGE_OVERHEAD
            }
            InputItem::ToolCallOutput { .. } => self.count_text(&item.text()) + TOOL_OUTPUT_OVERHEAD,
        }
    }

    /// Sum token costs over a whole history.
    fn count_history(&self, items: &[InputItem]) -> usize {
        items.iter().map(|item| self.count_item(item)).sum()
    }
}

/// The default [`TokenCounter`]: `ceil(len / 4)` for text, /// fixed costs for images.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::MessageRole;

    #[test]
    fn text_tokens_round_up() {
        let counter = HeuristicTokenCounter;
        assert_eq!(counter.count_text(""), 0);
        assert_eq!(counter.count_text("ab"), 1);
        assert_eq!(counter.count_text("abcde"), 2);
    }

    #[test]
    fn image_tokens_match_detail_table() {
        let counter = HeuristicTokenCounter;
        assert_eq!(counter.count_image(ImageDetail::Auto), 170);
        assert_eq!(counter.count_image(ImageDetail::Low), 85);
        assert_eq!(counter.count_image(ImageDetail::High), 765);
    }

    #[test]
    fn item_count_adds_message_overhead() {
        let counter = HeuristicTokenCounter;
        let item = InputItem::text_message(MessageRole::User, "abcd");
        assert_eq!(counter.count_item(&item), 1 + MESSAGE_OVERHEAD);
    }

    #[test]
    fn history_count_is_additive() {
        let counter = HeuristicTokenCounter;
        let items = vec![InputItem::user("ab"), InputItem::assistant("cd")];
        let sum: usize = items.iter().map(|i| counter.count_item(i)).sum();
        assert_eq!(counter.count_history(&items), sum);
    }
}
