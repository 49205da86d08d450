//! Error types for cascade pipelines.
//!
//! The taxonomy is deliberately small: a named stage failed, the run was
//! cancelled, the pipeline was misconfigured, or an internal invariant broke.
//! Stage failures are never retried by the executor; cancellation is never
//! reported as a stage failure.

use crate::cancellation::CancellationToken;
use thiserror::Error;

/// Error raised when a named stage fails.
///
/// The cause is opaque to the executor: whatever task-specific logic lives in
/// a stage's finalize function reports its own failure text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage_id}' failed: {cause}")]
pub struct StageError {
    /// The id of the stage that failed.
    pub stage_id: String,
    /// Opaque description of the failure.
    pub cause: String,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(stage_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            cause: cause.into(),
        }
    }
}

/// The main error type for cascade operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// A stage failed; the run was aborted at that stage.
    #[error("{0}")]
    Stage(#[from] StageError),

    /// The run was cancelled before it could finish.
    #[error("pipeline aborted: {0}")]
    Aborted(String),

    /// The pipeline was built from an incomplete or inconsistent
    /// specification.
    #[error("invalid pipeline: {0}")]
    Invalid(String),

    /// An internal invariant was violated. Seeing this means a bug in the
    /// executor or a stage whose finalize function is not deterministic.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl CascadeError {
    /// Builds the abort error for a cancelled token, carrying its reason.
    #[must_use]
    pub fn aborted_by(token: &CancellationToken) -> Self {
        Self::Aborted(
            token
                .reason()
                .unwrap_or_else(|| "cancellation requested".to_owned()),
        )
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}
