//! Convenience re-exports for crates consuming `agentic-window`.

pub use crate::sliding_window::SlidingWindow;
pub use crate::strategy::WindowStrategy;
pub use crate::summarization::Summarization;
pub use crate::token_counter::{HeuristicTokenCounter, TokenCounter};
