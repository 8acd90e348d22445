//! Policies applied when a [`crate::UserBuffer`] is full.

/// What to do when a user's buffer is at capacity and a new message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureStrategy {
    /// Reject the new message silently.
    DropNew,
    /// Evict the oldest buffered message, then append the new one.
    DropOldest,
    /// Reject the new message; the caller is expected to notify the user
    /// asynchronously (the notification channel is outside this crate).
    RejectWithNotification,
    /// Wait for space to free up, bounded by the service's configured
    /// `block_timeout`. On expiry the message is rejected rather than
    /// blocking forever — flags unbounded blocking under a
    /// webhook deadline as explicitly risky.
    BlockUntilSpace,
    /// Dispatch the current buffer immediately, then start a fresh buffer
    /// with the new message.
    FlushAndAccept,
}
