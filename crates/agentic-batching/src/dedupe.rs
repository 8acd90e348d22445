//! Idempotency store for `(userId, messageId)` pairs.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Tracks message ids that have already been handed to a [`crate::Processor`]
/// so a redelivered message is dropped rather than processed twice.
///
/// Retention is bounded only by "within retention" in the abstract, without
/// a concrete policy; this implementation keeps every id seen for the service's
/// lifetime (an embedding application with a persistence layer would swap
/// this for a store with expiry — see DESIGN.md).
#[derive(Clone)]
pub struct DedupeStore {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl DedupeStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether `message_id` has already been marked processed.
    pub async fn has_seen(&self, message_id: &str) -> bool {
        self.seen.lock().await.contains(message_id)
    }

    /// Mark a batch of message ids as processed.
    pub async fn mark_all(&self, message_ids: impl IntoIterator<Item = String>) {
        let mut seen = self.seen.lock().await;
        seen.extend(message_ids);
    }
}

impl Default for DedupeStore {
    fn default() -> Self {
        Self::new()
    }
}
