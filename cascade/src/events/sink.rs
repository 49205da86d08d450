//! Lifecycle sinks for observability.
//!
//! Sinks receive lifecycle notices (stage started, run finished) so a host
//! can log or monitor progress. They are strictly on the side: the pipeline's
//! data flows through the event relay, never through a sink, and a sink can
//! be swapped for [`NoOpEventSink`] without changing any payload.

use crate::utils::iso_timestamp;
use serde::Serialize;
use tracing::info;

/// A lifecycle notice handed to an [`EventSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleNotice {
    /// The notice type (e.g. "stage.started").
    #[serde(rename = "type")]
    pub notice_type: String,
    /// When the notice was produced (RFC 3339).
    pub timestamp: String,
    /// Notice payload.
    pub data: serde_json::Value,
}

impl LifecycleNotice {
    /// Creates a notice with the given type and payload.
    #[must_use]
    pub fn new(notice_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            notice_type: notice_type.into(),
            timestamp: iso_timestamp(),
            data,
        }
    }

    /// Creates a "stage.started" notice.
    #[must_use]
    pub fn stage_started(stage_id: &str, input_id: &str, position: usize) -> Self {
        Self::new(
            "stage.started",
            serde_json::json!({
                "stage": stage_id,
                "input": input_id,
                "position": position,
            }),
        )
    }

    /// Creates a "run.finished" notice.
    #[must_use]
    pub fn run_finished(run_id: &str, succeeded: bool) -> Self {
        Self::new(
            "run.finished",
            serde_json::json!({ "run_id": run_id, "succeeded": succeeded }),
        )
    }
}

/// Trait for sinks that receive lifecycle notices.
///
/// Implementations must never block and must never fail; a misbehaving sink
/// must not be able to take a pipeline down.
pub trait EventSink: Send + Sync {
    /// Receives one lifecycle notice.
    fn notify(&self, notice: &LifecycleNotice);
}

/// A sink that discards all notices. The default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn notify(&self, _notice: &LifecycleNotice) {
        // Intentionally empty - discards all notices
    }
}

/// A sink that logs notices through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn notify(&self, notice: &LifecycleNotice) {
        info!(
            notice_type = %notice.notice_type,
            data = %notice.data,
            "{}",
            notice.notice_type
        );
    }
}

/// A collecting sink for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    notices: parking_lot::RwLock<Vec<LifecycleNotice>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected notices.
    #[must_use]
    pub fn notices(&self) -> Vec<LifecycleNotice> {
        self.notices.read().clone()
    }

    /// Returns collected notices of a given type.
    #[must_use]
    pub fn notices_of_type(&self, notice_type: &str) -> Vec<LifecycleNotice> {
        self.notices
            .read()
            .iter()
            .filter(|n| n.notice_type == notice_type)
            .cloned()
            .collect()
    }

    /// Returns the number of collected notices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.read().len()
    }

    /// Returns true if no notices have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.read().is_empty()
    }

    /// Clears all collected notices.
    pub fn clear(&self) {
        self.notices.write().clear();
    }
}

impl EventSink for CollectingEventSink {
    fn notify(&self, notice: &LifecycleNotice) {
        self.notices.write().push(notice.clone());
    }
}
