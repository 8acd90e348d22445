//! Per-user bounded FIFO mailbox.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, Notify};

use crate::message::Message;

/// An independently-synchronized per-user mailbox. Created on first message
/// from a user and destroyed on successful flush or service shutdown
/// (ownership of that lifecycle lives in [`crate::BatchingService`]; this
/// type only owns the FIFO itself).
///
/// Grounded on `astralis_mcp::rate_limit::RateLimiter`'s per-key lock
/// granularity (concurrent users do not contend) combined with the
/// `AtomicU64` overflow counter used by
/// `agentic_telemetry::bus::TelemetryReceiver::dropped_count` for the
/// `DROP_OLDEST` eviction count.
pub struct UserBuffer {
    capacity: usize,
    messages: Mutex<VecDeque<Message>>,
    space_available: Notify,
    evicted_count: AtomicU64,
}

impl UserBuffer {
    /// Construct a buffer with a bounded capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            space_available: Notify::new(),
            evicted_count: AtomicU64::new(0),
        }
    }

    /// Current number of buffered messages.
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    /// Whether the buffer currently holds no messages.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Attempt to append without evicting. Returns `false` if the buffer is
    /// already at capacity.
    pub async fn try_push(&self, message: Message) -> bool {
        let mut messages = self.messages.lock().await;
        if messages.len() >= self.capacity {
            return false;
        }
        messages.push_back(message);
        true
    }

    /// Evict the oldest message (if any) and append the new one
    /// unconditionally. Increments the eviction counter.
    pub async fn push_evicting_oldest(&self, message: Message) {
        let mut messages = self.messages.lock().await;
        if messages.len() >= self.capacity {
            messages.pop_front();
            self.evicted_count.fetch_add(1, Ordering::Relaxed);
        }
        messages.push_back(message);
    }

    /// Wait until the buffer has room for at least one more message.
    ///
    /// Callers must bound this with a timeout themselves (`BLOCK_UNTIL_SPACE`
    /// is not meant to wait forever); this method alone never returns if no
    /// draining ever happens.
    pub async fn wait_for_space(&self) {
        loop {
            let notified = self.space_available.notified();
            if self.messages.lock().await.len() < self.capacity {
                return;
            }
            notified.await;
        }
    }

    /// Drain all buffered messages in FIFO order, leaving the buffer empty,
    /// and wake any `wait_for_space` waiters.
    pub async fn drain(&self) -> Vec<Message> {
        let mut messages = self.messages.lock().await;
        let drained: Vec<Message> = messages.drain(..).collect();
        drop(messages);
        if !drained.is_empty() {
            self.space_available.notify_waiters();
        }
        drained
    }

    /// Count of messages evicted by `DROP_OLDEST` since construction.
    pub fn evicted_count(&self) -> u64 {
        self.evicted_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn msg(id: &str) -> Message {
        Message::new("u1", id, "hi", Utc::now())
    }

    #[tokio::test]
    async fn try_push_rejects_when_full() {
        let buf = UserBuffer::new(2);
        assert!(buf.try_push(msg("1")).await);
        assert!(buf.try_push(msg("2")).await);
        assert!(!buf.try_push(msg("3")).await);
        assert_eq!(buf.len().await, 2);
    }

    #[tokio::test]
    async fn drain_preserves_fifo_order_and_empties() {
        let buf = UserBuffer::new(10);
        buf.try_push(msg("1")).await;
        buf.try_push(msg("2")).await;
        buf.try_push(msg("3")).await;
        let drained = buf.drain().await;
        assert_eq!(
            drained.iter().map(|m| m.message_id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        assert!(buf.is_empty().await);
    }

    #[tokio::test]
    async fn push_evicting_oldest_counts_evictions() {
        let buf = UserBuffer::new(2);
        buf.try_push(msg("1")).await;
        buf.try_push(msg("2")).await;
        buf.push_evicting_oldest(msg("3")).await;
        let drained = buf.drain().await;
        assert_eq!(
            drained.iter().map(|m| m.message_id.as_str()).collect::<Vec<_>>(),
            vec!["2", "3"]
        );
        assert_eq!(buf.evicted_count(), 1);
    }

    #[tokio::test]
    async fn wait_for_space_unblocks_after_drain() {
        let buf = std::sync::Arc::new(UserBuffer::new(1));
        buf.try_push(msg("1")).await;

        let waiter_buf = std::sync::Arc::clone(&buf);
        let waiter = tokio::spawn(async move {
            waiter_buf.wait_for_space().await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        buf.drain().await;

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("wait_for_space should unblock after drain")
            .unwrap();
    }
}
