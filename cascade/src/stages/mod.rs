//! Stage contract and implementations.
//!
//! A stage is the unit of work in a cascade pipeline. It declares its
//! progress steps and a pure finalize function; it does not decide when to
//! suspend or where its events go. Execution lives in [`driver`], which walks
//! the declared steps once, the same way for streaming and eager runs.

mod driver;
mod input;
mod pacing;

pub use driver::{run_stage, RunInterrupt, StageExecution};
pub(crate) use driver::drive_stage;
pub use input::StageInput;
pub use pacing::{FixedDelayPacer, NoopPacer, Pacer};

use crate::errors::StageError;
use std::fmt::Debug;

/// Trait for pipeline stages.
///
/// Task-specific logic lives entirely in [`Stage::finalize`]; the executor
/// owns everything else (pacing, event emission, folding). A stage must be
/// deterministic: given the same input and progress, `finalize` must return
/// the same payload, or streaming and eager runs of the same request will
/// disagree.
pub trait Stage: Send + Sync + Debug {
    /// Returns the stage id, used in error reports and lifecycle notices.
    fn id(&self) -> &str;

    /// Returns the ordered progress-step labels for one invocation.
    ///
    /// One progress event is emitted per label, each preceded by one unit of
    /// simulated work.
    fn progress_labels(&self, input: &StageInput) -> Vec<String>;

    /// Computes the final payload from the input and the collected progress.
    ///
    /// Pure: no suspension, no side effects.
    fn finalize(&self, input: &StageInput, progress: &[String]) -> Result<String, StageError>;
}

/// Closure type producing a stage's progress labels.
pub type LabelFn = dyn Fn(&StageInput) -> Vec<String> + Send + Sync;

/// Closure type computing a stage's final payload.
pub type FinalizeFn = dyn Fn(&StageInput, &[String]) -> Result<String, StageError> + Send + Sync;

/// A stage assembled from closures.
///
/// This is the only concrete stage the library ships; real task logic is
/// supplied by the host.
pub struct BlueprintStage {
    id: String,
    labels: Box<LabelFn>,
    finalize: Box<FinalizeFn>,
}

impl BlueprintStage {
    /// Creates a stage from a label function and a finalize function.
    pub fn new<L, F>(id: impl Into<String>, labels: L, finalize: F) -> Self
    where
        L: Fn(&StageInput) -> Vec<String> + Send + Sync + 'static,
        F: Fn(&StageInput, &[String]) -> Result<String, StageError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            labels: Box::new(labels),
            finalize: Box::new(finalize),
        }
    }

    /// Creates a stage with a fixed label list.
    pub fn with_labels<F>(id: impl Into<String>, labels: Vec<String>, finalize: F) -> Self
    where
        F: Fn(&StageInput, &[String]) -> Result<String, StageError> + Send + Sync + 'static,
    {
        Self::new(id, move |_| labels.clone(), finalize)
    }
}

impl Debug for BlueprintStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueprintStage")
            .field("id", &self.id)
            .finish()
    }
}

impl Stage for BlueprintStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn progress_labels(&self, input: &StageInput) -> Vec<String> {
        (self.labels)(input)
    }

    fn finalize(&self, input: &StageInput, progress: &[String]) -> Result<String, StageError> {
        (self.finalize)(input, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_stage_fixed_labels() {
        let stage = BlueprintStage::with_labels(
            "echo",
            vec!["one".into(), "two".into()],
            |input, progress| Ok(format!("{}:{}", input.id, progress.len())),
        );

        let input = StageInput::new("item_a");
        assert_eq!(stage.id(), "echo");
        assert_eq!(stage.progress_labels(&input), vec!["one", "two"]);
        assert_eq!(
            stage.finalize(&input, &["one".into(), "two".into()]),
            Ok("item_a:2".to_string())
        );
    }

    #[test]
    fn test_blueprint_stage_labels_see_input() {
        let stage = BlueprintStage::new(
            "templated",
            |input| vec![format!("working on {}", input.id)],
            |_, _| Ok(String::new()),
        );

        let labels = stage.progress_labels(&StageInput::new("item_b"));
        assert_eq!(labels, vec!["working on item_b"]);
    }

    #[test]
    fn test_blueprint_stage_failure_propagates() {
        let stage = BlueprintStage::with_labels("broken", Vec::new(), |input, _| {
            Err(StageError::new(&input.id, "nope"))
        });

        let err = stage
            .finalize(&StageInput::new("broken"), &[])
            .expect_err("stage should fail");
        assert_eq!(err.stage_id, "broken");
    }
}
