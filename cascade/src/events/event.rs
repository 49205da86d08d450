//! The outward-facing pipeline event record.

use crate::errors::CascadeError;
use serde::{Deserialize, Serialize};

/// The kind of a pipeline event.
///
/// Events are tagged, not typed: a consumer filters by kind, the executor
/// never does (it forwards everything unless configured otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An incremental progress event from a stage. Carries a scope when a
    /// per-item stage produced it, no scope for the reduction stage.
    Progress,
    /// A per-item stage's final event.
    StageFinal,
    /// The reduction stage's final event, before post-processing.
    ReductionFinal,
    /// The terminal event of a run: the reduction payload after the
    /// finishing transform was applied.
    PipelineResult,
}

impl EventKind {
    /// Returns true for the final-event kinds (everything except progress).
    #[must_use]
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Progress)
    }
}

/// An immutable event emitted during a pipeline run.
///
/// Serializes to the wire shape `{ kind, scope?, data }`, suitable for an
/// SSE or CLI runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event kind.
    pub kind: EventKind,
    /// The per-item stage invocation that produced the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Opaque payload.
    pub data: String,
}

impl PipelineEvent {
    /// Creates a progress event scoped to a per-item stage invocation.
    #[must_use]
    pub fn progress(scope: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Progress,
            scope: Some(scope.into()),
            data: data.into(),
        }
    }

    /// Creates an unscoped (reduction-level) progress event.
    #[must_use]
    pub fn reduction_progress(data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Progress,
            scope: None,
            data: data.into(),
        }
    }

    /// Creates a per-item stage's final event.
    #[must_use]
    pub fn stage_final(scope: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::StageFinal,
            scope: Some(scope.into()),
            data: data.into(),
        }
    }

    /// Creates the reduction stage's final event.
    #[must_use]
    pub fn reduction_final(data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::ReductionFinal,
            scope: None,
            data: data.into(),
        }
    }

    /// Creates the terminal result event of a run.
    #[must_use]
    pub fn result(data: impl Into<String>) -> Self {
        Self {
            kind: EventKind::PipelineResult,
            scope: None,
            data: data.into(),
        }
    }
}

/// The streaming variant of a run's output: a finite, non-restartable
/// sequence of events, terminated either by the [`EventKind::PipelineResult`]
/// event or by a single error.
///
/// The channel has no buffer, so events are handed to the consumer as soon
/// as they are produced and the producer suspends until each one is read.
pub type EventStream = futures::channel::mpsc::Receiver<Result<PipelineEvent, CascadeError>>;
