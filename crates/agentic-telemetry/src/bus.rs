//! [`TelemetryBus`]: per-processor bounded FIFO + worker.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use crate::event::TelemetryEvent;

/// Consumes [`TelemetryEvent`]s published to a [`TelemetryBus`].
pub trait TelemetryProcessor: Send + Sync {
    /// Handle one event. Called on the processor's own worker task; a slow
    /// implementation only delays that processor's own queue, never the
    /// publisher or other processors.
    fn process(&self, event: &TelemetryEvent);
}

/// Fans published events out to every subscribed [`TelemetryReceiver`].
///
/// `publish` never blocks the caller: it is a `broadcast::Sender::send`,
/// which only fails if there are no receivers. A receiver that falls more
/// than `capacity` events behind the publisher loses the oldest ones —
/// exactly "on queue overflow, the oldest event is dropped
/// and a counter is incremented" — surfaced via
/// [`TelemetryReceiver::dropped_count`]/[`TelemetryWorkerHandle::dropped_count`].
///
/// Grounded on `astrid_events::bus::EventBus`'s `broadcast::Sender` +
/// `RecvError::Lagged` pattern. The per-receiver pending counter used by
/// [`TelemetryWorkerHandle::flush`] is a minimal addition to give
/// `flush(timeout)` a real signal to wait on, in the same atomics-over-locks
/// idiom used elsewhere in this crate.
pub struct TelemetryBus {
    sender: broadcast::Sender<Arc<TelemetryEvent>>,
    pending_counters: Mutex<Vec<Weak<AtomicI64>>>,
}

impl TelemetryBus {
    /// A bus whose receivers each buffer up to `capacity` unread events
    /// before the oldest are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            pending_counters: Mutex::new(Vec::new()),
        }
    }

    /// Publish one event to every current subscriber. Never blocks.
    pub fn publish(&self, event: TelemetryEvent) {
        let event = Arc::new(event);
        let _ = self.sender.send(event);
        let mut counters = self.pending_counters.lock().expect("pending counters mutex poisoned");
        counters.retain(|weak| match weak.upgrade() {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        });
    }

    /// Subscribe a new, independent receiver starting from the current tail.
    #[must_use]
    pub fn subscribe(&self) -> TelemetryReceiver {
        let pending = Arc::new(AtomicI64::new(0));
        self.pending_counters
            .lock()
            .expect("pending counters mutex poisoned")
            .push(Arc::downgrade(&pending));
        TelemetryReceiver {
            inner: self.sender.subscribe(),
            dropped: Arc::new(AtomicU64::new(0)),
            pending,
        }
    }

    /// Spawn a worker task that drains a fresh subscription into
    /// `processor`, returning a handle to observe or stop it.
    pub fn spawn_processor(&self, processor: Arc<dyn TelemetryProcessor>) -> TelemetryWorkerHandle {
        let mut receiver = self.subscribe();
        let dropped = Arc::clone(&receiver.dropped);
        let pending = Arc::clone(&receiver.pending);
        let shutdown = Arc::new(Notify::new());
        let worker_shutdown = Arc::clone(&shutdown);

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = worker_shutdown.notified() => break,
                    event = receiver.recv() => match event {
                        Some(event) => processor.process(&event),
                        None => break,
                    },
                }
            }
        });

        TelemetryWorkerHandle {
            dropped,
            pending,
            shutdown,
            join: Some(join),
        }
    }
}

/// One subscriber's view of a [`TelemetryBus`].
pub struct TelemetryReceiver {
    inner: broadcast::Receiver<Arc<TelemetryEvent>>,
    dropped: Arc<AtomicU64>,
    pending: Arc<AtomicI64>,
}

impl TelemetryReceiver {
    /// Wait for the next event, transparently counting and logging any
    /// events dropped because this receiver fell behind.
    pub async fn recv(&mut self) -> Option<Arc<TelemetryEvent>> {
        loop {
            match self.inner.recv().await {
                Ok(event) => {
                    self.pending.fetch_sub(1, Ordering::Relaxed);
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped.fetch_add(skipped, Ordering::Relaxed);
                    self.pending.fetch_sub(skipped as i64, Ordering::Relaxed);
                    tracing::warn!(skipped, "telemetry receiver lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Events dropped for this receiver so far.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A running [`TelemetryProcessor`] worker spawned by
/// [`TelemetryBus::spawn_processor`].
pub struct TelemetryWorkerHandle {
    dropped: Arc<AtomicU64>,
    pending: Arc<AtomicI64>,
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl TelemetryWorkerHandle {
    /// Events dropped before this worker could process them.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wait until this worker has caught up to everything published so
    /// far, or `timeout` elapses`).
    pub async fn flush(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.pending.load(Ordering::Relaxed) > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Signal the worker to stop after its current event, then wait for it
    /// to exit`).
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}
