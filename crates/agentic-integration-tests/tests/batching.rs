//! The batching/rate-limit scenarios — neither has any
//! coverage inside `agentic-batching` itself, since both require wall-clock
//! timing across the whole receive → timer → dispatch pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentic_batching::{
    BatchMeta, BatchingConfig, BatchingService, Message, Processor, RateLimiterConfig,
};
use async_trait::async_trait;
use chrono::Utc;

#[derive(Default)]
struct RecordingProcessor {
    batches: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl Processor for RecordingProcessor {
    async fn process(
        &self,
        _user_id: &str,
        messages: &[Message],
        _meta: &BatchMeta,
    ) -> Result<(), agentic_batching::BatchingError> {
        self.batches.lock().unwrap().push(
            messages
                .iter()
                .map(|m| m.content.clone())
                .collect(),
        );
        Ok(())
    }
}

#[tokio::test]
async fn s6_silence_timer_fires_once_traffic_stops_and_preserves_order() {
    let processor = Arc::new(RecordingProcessor::default());
    let config = BatchingConfig::new()
        .with_silence_threshold(Duration::from_millis(500))
        .with_adaptive_timeout(Duration::from_secs(5))
        .with_buffer_capacity(50);
    let service = BatchingService::new(config, processor.clone());

    for i in 0..3 {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let message = Message::new("alice", format!("m{i}"), format!("msg-{i}"), Utc::now());
        service.receive_message(message).await;
    }

    tokio::time::sleep(Duration::from_millis(700)).await;

    let batches = processor.batches.lock().unwrap();
    assert_eq!(batches.len(), 1, "expected exactly one dispatched batch, got {batches:?}");
    assert_eq!(batches[0], vec!["msg-0", "msg-1", "msg-2"]);
}

#[tokio::test]
async fn s7_rate_limiter_rejects_excess_bursts_then_admits_after_the_window_elapses() {
    let processor = Arc::new(RecordingProcessor::default());
    let rate_limiter = RateLimiterConfig::new(15, 10, 5, chrono::Duration::seconds(10));
    let config = BatchingConfig::new()
        .with_rate_limiter(rate_limiter)
        .with_silence_threshold(Duration::from_millis(50))
        .with_adaptive_timeout(Duration::from_millis(100));
    let service = BatchingService::new(config, processor.clone());

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..15 {
        let message = Message::new("bob", format!("burst{i}"), format!("b{i}"), Utc::now());
        match service.receive_message(message).await {
            agentic_batching::ReceiveOutcome::Enqueued => accepted += 1,
            agentic_batching::ReceiveOutcome::RateLimited => rejected += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(accepted, 5, "sliding window of 5 per 10s should cap acceptance");
    assert_eq!(rejected, 10);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let after_window = service
        .receive_message(Message::new("bob", "after-window", "b-after", Utc::now()))
        .await;
    assert_eq!(after_window, agentic_batching::ReceiveOutcome::Enqueued);
}
