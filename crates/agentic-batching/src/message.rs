//! The inbound message shape consumed by the batching pipeline.

use chrono::{DateTime, Utc};

/// One inbound message from a user-facing frontend.
///
/// The batching layer consumes only this contract — `{ userId, messageId,
/// content, timestamp }` — regardless of which messaging platform produced
/// it; platform-specific parsing happens upstream, outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifies the user whose mailbox this message belongs to.
    pub user_id: String,
    /// Unique id used for deduplication and dead-letter reporting.
    pub message_id: String,
    /// Message body.
    pub content: String,
    /// When the message was received upstream.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Construct a message.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        message_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            message_id: message_id.into(),
            content: content.into(),
            timestamp,
        }
    }
}
