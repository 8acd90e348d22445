//! Per-user adaptive-flush batching pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use agentic_telemetry::{generate_span_id, generate_trace_id, SpanIds, TelemetryBus, TelemetryEvent};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backpressure::BackpressureStrategy;
use crate::dedupe::DedupeStore;
use crate::error::BatchingError;
use crate::error_handling::{ErrorHandlingStrategy, LoggingTerminalHandler, TerminalHandler};
use crate::message::Message;
use crate::rate_limiter::{HybridRateLimiter, RateLimiterConfig};
use crate::user_buffer::UserBuffer;

/// Why a batch was dispatched to the [`Processor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchReason {
    /// The silence timer fired with no new message since it was armed.
    Silence,
    /// The maximum timer fired regardless of recent activity.
    MaxTimeout,
    /// `FLUSH_AND_ACCEPT` backpressure forced an immediate dispatch.
    FlushAndAccept,
    /// The service was shut down while messages were still buffered.
    Shutdown,
}

/// Metadata accompanying one call to [`Processor::process`].
#[derive(Debug, Clone)]
pub struct BatchMeta {
    /// Unique id for this batch, generated at dispatch time.
    pub batch_id: String,
    /// `messageId` of the first message in the batch.
    pub first_id: String,
    /// `messageId` of the last message in the batch.
    pub last_id: String,
    /// Why this dispatch happened.
    pub reason: DispatchReason,
    /// 0 on the first attempt; incremented on each retry.
    pub retry_attempt: u32,
}

/// Consumes one user's batch of messages.
///
/// Grounded on `agentic_core::Tool`'s `async_trait` object-safety pattern —
/// the embedding application supplies an `Arc<dyn Processor>` rather than a
/// generic type parameter, so `BatchingService` itself stays non-generic.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Handle one dispatched batch for `user_id`. An `Err` triggers the
    /// configured [`ErrorHandlingStrategy`].
    async fn process(
        &self,
        user_id: &str,
        messages: &[Message],
        meta: &BatchMeta,
    ) -> Result<(), BatchingError>;
}

/// Configuration for a [`BatchingService`].
#[derive(Clone)]
pub struct BatchingConfig {
    /// Per-user buffer capacity.
    pub buffer_capacity: usize,
    /// Silence timer: dispatch if no new message arrives within this long.
    pub silence_threshold: Duration,
    /// Maximum timer: dispatch unconditionally after this long, even under
    /// continuous traffic.
    pub adaptive_timeout: Duration,
    /// Policy applied when a user's buffer is full.
    pub backpressure: BackpressureStrategy,
    /// Bound on `BLOCK_UNTIL_SPACE`'s wait.
    pub block_timeout: Duration,
    /// Retry policy for failed batch dispatches.
    pub error_handling: ErrorHandlingStrategy,
    /// Rate limiter configuration, shared by every user.
    pub rate_limiter: RateLimiterConfig,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 50,
            silence_threshold: Duration::from_millis(500),
            adaptive_timeout: Duration::from_secs(5),
            backpressure: BackpressureStrategy::DropNew,
            block_timeout: Duration::from_secs(10),
            error_handling: ErrorHandlingStrategy::default(),
            rate_limiter: RateLimiterConfig::default(),
        }
    }
}

impl BatchingConfig {
    /// Construct the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-user buffer capacity.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the silence timer duration.
    #[must_use]
    pub fn with_silence_threshold(mut self, duration: Duration) -> Self {
        self.silence_threshold = duration;
        self
    }

    /// Set the maximum timer duration.
    #[must_use]
    pub fn with_adaptive_timeout(mut self, duration: Duration) -> Self {
        self.adaptive_timeout = duration;
        self
    }

    /// Set the backpressure strategy.
    #[must_use]
    pub fn with_backpressure(mut self, strategy: BackpressureStrategy) -> Self {
        self.backpressure = strategy;
        self
    }

    /// Set the `BLOCK_UNTIL_SPACE` wait bound.
    #[must_use]
    pub fn with_block_timeout(mut self, duration: Duration) -> Self {
        self.block_timeout = duration;
        self
    }

    /// Set the retry policy for failed dispatches.
    #[must_use]
    pub fn with_error_handling(mut self, strategy: ErrorHandlingStrategy) -> Self {
        self.error_handling = strategy;
        self
    }

    /// Set the rate limiter configuration.
    #[must_use]
    pub fn with_rate_limiter(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limiter = config;
        self
    }
}

/// Outcome of [`BatchingService::receive_message`], returned so the caller
/// (e.g. a webhook handler) can react — notifying the user is a messaging-
/// platform concern and stays outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Accepted into the user's buffer; a flush timer is armed.
    Enqueued,
    /// `messageId` had already been marked processed.
    Deduplicated,
    /// Denied by the [`HybridRateLimiter`].
    RateLimited,
    /// Denied by the configured [`BackpressureStrategy`].
    BackpressureRejected {
        /// The strategy that produced the rejection.
        strategy: BackpressureStrategy,
    },
    /// `FLUSH_AND_ACCEPT` dispatched the prior buffer and accepted this
    /// message into a fresh one.
    FlushedAndAccepted,
}

struct UserState {
    buffer: UserBuffer,
    epoch: AtomicU64,
    max_timer_armed: AtomicBool,
}

impl UserState {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: UserBuffer::new(capacity),
            epoch: AtomicU64::new(0),
            max_timer_armed: AtomicBool::new(false),
        }
    }
}

/// All the pieces a spawned timer/dispatch task needs, cloned out of
/// [`BatchingService`] so the spawned future does not borrow `&self`.
#[derive(Clone)]
struct Dispatcher {
    processor: Arc<dyn Processor>,
    terminal_handler: Arc<dyn TerminalHandler>,
    dedupe: DedupeStore,
    error_handling: ErrorHandlingStrategy,
    telemetry: Option<Arc<TelemetryBus>>,
}

impl Dispatcher {
    async fn dispatch(&self, user_id: String, messages: Vec<Message>, reason: DispatchReason) {
        if messages.is_empty() {
            return;
        }
        let batch_id = Uuid::new_v4().to_string();
        let first_id = messages[0].message_id.clone();
        let last_id = messages[messages.len() - 1].message_id.clone();

        let span_ids = self.telemetry.as_ref().map(|bus| {
            let trace_id = generate_trace_id();
            let ids = SpanIds {
                session_id: user_id.clone(),
                trace_id,
                span_id: generate_span_id(),
                parent_span_id: None,
            };
            bus.publish(TelemetryEvent::started(
                ids.clone(),
                serde_json::json!({"batch_id": batch_id, "message_count": messages.len(), "reason": format!("{reason:?}")}),
            ));
            ids
        });

        let mut attempt = 0u32;
        loop {
            let meta = BatchMeta {
                batch_id: batch_id.clone(),
                first_id: first_id.clone(),
                last_id: last_id.clone(),
                reason,
                retry_attempt: attempt,
            };
            match self.processor.process(&user_id, &messages, &meta).await {
                Ok(()) => {
                    self.dedupe
                        .mark_all(messages.iter().map(|m| m.message_id.clone()))
                        .await;
                    info!(user_id = %user_id, batch_id = %meta.batch_id, attempt, "batch dispatched");
                    if let (Some(bus), Some(ids)) = (&self.telemetry, &span_ids) {
                        bus.publish(TelemetryEvent::completed(
                            ids.clone(),
                            serde_json::json!({"batch_id": meta.batch_id, "attempt": attempt}),
                        ));
                    }
                    return;
                }
                Err(cause) => {
                    if self.error_handling.has_retries_remaining(attempt) {
                        let delay = self.error_handling.delay_for_attempt(attempt + 1);
                        warn!(
                            user_id = %user_id,
                            batch_id = %meta.batch_id,
                            attempt,
                            ?delay,
                            %cause,
                            "batch dispatch failed, scheduling retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    if let (Some(bus), Some(ids)) = (&self.telemetry, &span_ids) {
                        bus.publish(TelemetryEvent::failed(
                            ids.clone(),
                            serde_json::json!({"batch_id": meta.batch_id, "attempt": attempt, "error": cause.to_string()}),
                        ));
                    }
                    self.terminal_handler
                        .handle_exhausted(&user_id, &messages, &cause)
                        .await;
                    return;
                }
            }
        }
    }
}

/// Per-user adaptive flushing pipeline: receive → dedupe → rate-limit →
/// enqueue-with-backpressure → schedule → dispatch to [`Processor`].
///
/// Grounded on `astralis_mcp::rate_limit::RateLimiter`'s per-key state map
/// plus `astrid_hooks::executor::HookExecutor`'s async dispatch style; the
/// silence/max timer pair is a minimal addition with no direct teacher
/// counterpart (see DESIGN.md).
pub struct BatchingService {
    config: BatchingConfig,
    rate_limiter: HybridRateLimiter,
    users: Mutex<HashMap<String, Arc<UserState>>>,
    dispatcher: Dispatcher,
}

impl BatchingService {
    /// Construct a service with the default [`LoggingTerminalHandler`].
    #[must_use]
    pub fn new(config: BatchingConfig, processor: Arc<dyn Processor>) -> Self {
        Self::with_terminal_handler(config, processor, Arc::new(LoggingTerminalHandler))
    }

    /// Construct a service with a custom exhausted-retry handler (e.g. a
    /// dead-letter store).
    #[must_use]
    pub fn with_terminal_handler(
        config: BatchingConfig,
        processor: Arc<dyn Processor>,
        terminal_handler: Arc<dyn TerminalHandler>,
    ) -> Self {
        let rate_limiter = HybridRateLimiter::new(config.rate_limiter);
        Self {
            dispatcher: Dispatcher {
                processor,
                terminal_handler,
                dedupe: DedupeStore::new(),
                error_handling: config.error_handling.clone(),
                telemetry: None,
            },
            config,
            rate_limiter,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Publish a [`agentic_telemetry::TelemetryEvent`] around each batch
    /// dispatch on `bus`.
    #[must_use]
    pub fn with_telemetry(mut self, bus: Arc<TelemetryBus>) -> Self {
        self.dispatcher.telemetry = Some(bus);
        self
    }

    async fn user_state(&self, user_id: &str) -> Arc<UserState> {
        let mut users = self.users.lock().await;
        Arc::clone(
            users
                .entry(user_id.to_owned())
                .or_insert_with(|| Arc::new(UserState::new(self.config.buffer_capacity))),
        )
    }

    /// Receive path: dedupe, rate-limit, admit with
    /// backpressure, then arm the silence/max timers.
    pub async fn receive_message(&self, message: Message) -> ReceiveOutcome {
        if self.dispatcher.dedupe.has_seen(&message.message_id).await {
            return ReceiveOutcome::Deduplicated;
        }

        if !self.rate_limiter.try_acquire(&message.user_id).await {
            return ReceiveOutcome::RateLimited;
        }

        let state = self.user_state(&message.user_id).await;
        let outcome = self.admit(&state, message.clone()).await;
        if !matches!(
            outcome,
            ReceiveOutcome::BackpressureRejected { .. } | ReceiveOutcome::RateLimited
        ) {
            self.arm_timers(message.user_id.clone(), Arc::clone(&state));
        }
        outcome
    }

    async fn admit(&self, state: &Arc<UserState>, message: Message) -> ReceiveOutcome {
        if state.buffer.try_push(message.clone()).await {
            return ReceiveOutcome::Enqueued;
        }

        match self.config.backpressure {
            BackpressureStrategy::DropNew | BackpressureStrategy::RejectWithNotification => {
                ReceiveOutcome::BackpressureRejected {
                    strategy: self.config.backpressure,
                }
            }
            BackpressureStrategy::DropOldest => {
                state.buffer.push_evicting_oldest(message).await;
                ReceiveOutcome::Enqueued
            }
            BackpressureStrategy::BlockUntilSpace => {
                match tokio::time::timeout(self.config.block_timeout, state.buffer.wait_for_space())
                    .await
                {
                    Ok(()) => {
                        // Space freed; another waiter may have taken it, so
                        // fall back to rejecting rather than evicting.
                        if state.buffer.try_push(message).await {
                            ReceiveOutcome::Enqueued
                        } else {
                            ReceiveOutcome::BackpressureRejected {
                                strategy: self.config.backpressure,
                            }
                        }
                    }
                    Err(_elapsed) => ReceiveOutcome::BackpressureRejected {
                        strategy: self.config.backpressure,
                    },
                }
            }
            BackpressureStrategy::FlushAndAccept => {
                let drained = state.buffer.drain().await;
                let dispatcher = self.dispatcher.clone();
                let user_id = message.user_id.clone();
                tokio::spawn(async move {
                    dispatcher
                        .dispatch(user_id, drained, DispatchReason::FlushAndAccept)
                        .await;
                });
                state.buffer.try_push(message).await;
                ReceiveOutcome::FlushedAndAccepted
            }
        }
    }

    fn arm_timers(&self, user_id: String, state: Arc<UserState>) {
        let epoch = state.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let silence = self.config.silence_threshold;
        let dispatcher = self.dispatcher.clone();
        let silence_state = Arc::clone(&state);
        let silence_user = user_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(silence).await;
            if silence_state.epoch.load(Ordering::SeqCst) == epoch {
                let drained = silence_state.buffer.drain().await;
                dispatcher
                    .dispatch(silence_user, drained, DispatchReason::Silence)
                    .await;
            }
        });

        if !state.max_timer_armed.swap(true, Ordering::SeqCst) {
            let max_timeout = self.config.adaptive_timeout;
            let dispatcher = self.dispatcher.clone();
            let max_state = Arc::clone(&state);
            let max_user = user_id;
            tokio::spawn(async move {
                tokio::time::sleep(max_timeout).await;
                max_state.max_timer_armed.store(false, Ordering::SeqCst);
                let drained = max_state.buffer.drain().await;
                dispatcher
                    .dispatch(max_user, drained, DispatchReason::MaxTimeout)
                    .await;
            });
        }
    }

    /// Drain and dispatch every user's buffer immediately, for graceful
    /// shutdown. Does not cancel in-flight dispatches already spawned by a
    /// timer; it only flushes what is still sitting in a buffer.
    pub async fn shutdown(&self) {
        let users: Vec<(String, Arc<UserState>)> = {
            let guard = self.users.lock().await;
            guard.iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect()
        };
        for (user_id, state) in users {
            let drained = state.buffer.drain().await;
            self.dispatcher
                .dispatch(user_id, drained, DispatchReason::Shutdown)
                .await;
        }
    }
}
