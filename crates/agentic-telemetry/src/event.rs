//! [`TelemetryEvent`]: the programmatic record of one span.
//!
//! `tracing` spans/events are for humans reading logs; `TelemetryEvent`s are
//! for programmatic consumers (dashboards, replay) and travel through a
//! [`crate::TelemetryBus`] instead of a subscriber.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four named events: a response (Responder call, tool invocation, or
/// loop turn) starting, completing, or failing, and a whole agent run
/// failing. One shape covers the first three since they only differ in
/// `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A response began.
    ResponseStarted {
        /// The session this interaction belongs to.
        session_id: String,
        /// The interaction-wide trace id.
        trace_id: String,
        /// This span's own id.
        span_id: String,
        /// The enclosing span, `None` only for the root span.
        parent_span_id: Option<String>,
        /// Wall-clock time this event was recorded, nanoseconds since the epoch.
        timestamp_nanos: u64,
        /// Caller-supplied detail (span name, model name, tool name, ...).
        attributes: Value,
    },
    /// A response completed successfully.
    ResponseCompleted {
        /// The session this interaction belongs to.
        session_id: String,
        /// The interaction-wide trace id.
        trace_id: String,
        /// The completed span's id.
        span_id: String,
        /// The enclosing span, `None` only for the root span.
        parent_span_id: Option<String>,
        /// Wall-clock time this event was recorded, nanoseconds since the epoch.
        timestamp_nanos: u64,
        /// Caller-supplied detail (e.g. `duration_nanos`, token usage).
        attributes: Value,
    },
    /// A response failed.
    ResponseFailed {
        /// The session this interaction belongs to.
        session_id: String,
        /// The interaction-wide trace id.
        trace_id: String,
        /// The failed span's id.
        span_id: String,
        /// The enclosing span, `None` only for the root span.
        parent_span_id: Option<String>,
        /// Wall-clock time this event was recorded, nanoseconds since the epoch.
        timestamp_nanos: u64,
        /// Caller-supplied detail, including a human-readable cause.
        attributes: Value,
    },
    /// A whole agent run terminated in failure (guardrail rejection, turn
    /// budget exceeded, exhausted Responder retries, structured-output
    /// parse failure).
    AgentFailed {
        /// The session this interaction belongs to.
        session_id: String,
        /// The interaction-wide trace id.
        trace_id: String,
        /// The root span's id.
        span_id: String,
        /// The enclosing span, `None` only for the root span.
        parent_span_id: Option<String>,
        /// Wall-clock time this event was recorded, nanoseconds since the epoch.
        timestamp_nanos: u64,
        /// Caller-supplied detail, including the terminal reason.
        attributes: Value,
    },
}

/// The identifying fields shared by every [`TelemetryEvent`] variant, so
/// publish call sites build these once per span instead of repeating four
/// near-identical field lists.
#[derive(Debug, Clone)]
pub struct SpanIds {
    /// The session this interaction belongs to.
    pub session_id: String,
    /// The interaction-wide trace id.
    pub trace_id: String,
    /// This span's own id.
    pub span_id: String,
    /// The enclosing span, `None` only for the root span.
    pub parent_span_id: Option<String>,
}

fn now_nanos() -> u64 {
    u64::try_from(Utc::now().timestamp_nanos_opt().unwrap_or(0).max(0)).unwrap_or(0)
}

impl TelemetryEvent {
    /// Build a [`TelemetryEvent::ResponseStarted`] stamped with the current time.
    #[must_use]
    pub fn started(ids: SpanIds, attributes: Value) -> Self {
        Self::ResponseStarted {
            session_id: ids.session_id,
            trace_id: ids.trace_id,
            span_id: ids.span_id,
            parent_span_id: ids.parent_span_id,
            timestamp_nanos: now_nanos(),
            attributes,
        }
    }

    /// Build a [`TelemetryEvent::ResponseCompleted`] stamped with the current time.
    #[must_use]
    pub fn completed(ids: SpanIds, attributes: Value) -> Self {
        Self::ResponseCompleted {
            session_id: ids.session_id,
            trace_id: ids.trace_id,
            span_id: ids.span_id,
            parent_span_id: ids.parent_span_id,
            timestamp_nanos: now_nanos(),
            attributes,
        }
    }

    /// Build a [`TelemetryEvent::ResponseFailed`] stamped with the current time.
    #[must_use]
    pub fn failed(ids: SpanIds, attributes: Value) -> Self {
        Self::ResponseFailed {
            session_id: ids.session_id,
            trace_id: ids.trace_id,
            span_id: ids.span_id,
            parent_span_id: ids.parent_span_id,
            timestamp_nanos: now_nanos(),
            attributes,
        }
    }

    /// Build a [`TelemetryEvent::AgentFailed`] stamped with the current time.
    #[must_use]
    pub fn agent_failed(ids: SpanIds, attributes: Value) -> Self {
        Self::AgentFailed {
            session_id: ids.session_id,
            trace_id: ids.trace_id,
            span_id: ids.span_id,
            parent_span_id: ids.parent_span_id,
            timestamp_nanos: now_nanos(),
            attributes,
        }
    }

    /// The trace id carried by any variant.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        match self {
            Self::ResponseStarted { trace_id, .. }
            | Self::ResponseCompleted { trace_id, .. }
            | Self::ResponseFailed { trace_id, .. }
            | Self::AgentFailed { trace_id, .. } => trace_id,
        }
    }

    /// The span id carried by any variant.
    #[must_use]
    pub fn span_id(&self) -> &str {
        match self {
            Self::ResponseStarted { span_id, .. }
            | Self::ResponseCompleted { span_id, .. }
            | Self::ResponseFailed { span_id, .. }
            | Self::AgentFailed { span_id, .. } => span_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(span_id: &str) -> SpanIds {
        SpanIds {
            session_id: "session-1".to_string(),
            trace_id: "t1".to_string(),
            span_id: span_id.to_string(),
            parent_span_id: None,
        }
    }

    #[test]
    fn trace_and_span_id_accessors_cover_every_variant() {
        let started = TelemetryEvent::started(ids("s1"), serde_json::json!({"name": "loop"}));
        assert_eq!(started.trace_id(), "t1");
        assert_eq!(started.span_id(), "s1");

        let completed = TelemetryEvent::completed(ids("s2"), serde_json::json!({"duration_nanos": 1_000}));
        assert_eq!(completed.span_id(), "s2");

        let failed = TelemetryEvent::failed(ids("s3"), serde_json::json!({"error": "boom"}));
        assert_eq!(failed.span_id(), "s3");

        let agent_failed =
            TelemetryEvent::agent_failed(ids("s4"), serde_json::json!({"reason": "TurnBudgetExceeded"}));
        assert_eq!(agent_failed.span_id(), "s4");
    }

    #[test]
    fn serde_round_trip_preserves_tag() {
        let event = TelemetryEvent::started(
            SpanIds {
                session_id: "session-1".to_string(),
                trace_id: "t1".to_string(),
                span_id: "s1".to_string(),
                parent_span_id: Some("root".to_string()),
            },
            serde_json::json!({"name": "tool.echo", "tool_name": "echo"}),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"response_started\""));
        let back: TelemetryEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.span_id(), "s1");
    }
}
