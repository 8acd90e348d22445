//! Context-window management.
//!
//! A [`TokenCounter`] estimates cost per item; a [`WindowStrategy`] reduces
//! a history to fit a token budget without mutating the underlying
//! [`agentic_core::Context`]. Two strategies are provided:
//! [`SlidingWindow`] (keep the newest items that fit) and [`Summarization`]
//! (replace older items with an LLM-generated synthetic summary,
//! falling back to [`SlidingWindow`] on any failure).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod prelude;
pub mod sliding_window;
pub mod strategy;
pub mod summarization;
pub mod token_counter;

pub use sliding_window::SlidingWindow;
pub use strategy::WindowStrategy;
pub use summarization::Summarization;
pub use token_counter::{HeuristicTokenCounter, TokenCounter};
