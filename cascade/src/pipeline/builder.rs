//! Pipeline builder.

use crate::errors::CascadeError;
use crate::events::{EventSink, NoOpEventSink};
use crate::pipeline::executor::{Finisher, Pipeline, PipelineInner, Planner};
use crate::pipeline::ForwardPolicy;
use crate::stages::{NoopPacer, Pacer, Stage, StageInput};
use std::sync::Arc;

/// Builds a [`Pipeline`].
///
/// A planner, a per-item stage and a reduction stage are required;
/// everything else has a sensible default (no delays, no sink, forward
/// everything, identity finishing).
pub struct PipelineBuilder {
    name: String,
    planner: Option<Box<Planner>>,
    item_stage: Option<Arc<dyn Stage>>,
    reduction_stage: Option<Arc<dyn Stage>>,
    finisher: Box<Finisher>,
    pacer: Arc<dyn Pacer>,
    sink: Arc<dyn EventSink>,
    policy: ForwardPolicy,
}

impl PipelineBuilder {
    /// Creates a builder for a pipeline with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            planner: None,
            item_stage: None,
            reduction_stage: None,
            finisher: Box::new(|payload| payload),
            pacer: Arc::new(NoopPacer),
            sink: Arc::new(NoOpEventSink),
            policy: ForwardPolicy::default(),
        }
    }

    /// Sets the planner producing per-item inputs from a request.
    #[must_use]
    pub fn planner<P>(mut self, planner: P) -> Self
    where
        P: Fn(&str) -> Vec<StageInput> + Send + Sync + 'static,
    {
        self.planner = Some(Box::new(planner));
        self
    }

    /// Plans the same fixed input list for every request.
    #[must_use]
    pub fn fixed_inputs(self, inputs: Vec<StageInput>) -> Self {
        self.planner(move |_| inputs.clone())
    }

    /// Sets the per-item stage.
    #[must_use]
    pub fn item_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.item_stage = Some(Arc::new(stage));
        self
    }

    /// Sets the reduction stage.
    #[must_use]
    pub fn reduction_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.reduction_stage = Some(Arc::new(stage));
        self
    }

    /// Sets the finishing transform applied to the terminal payload.
    #[must_use]
    pub fn finisher<F>(mut self, finisher: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.finisher = Box::new(finisher);
        self
    }

    /// Finishing transform that appends a literal marker.
    #[must_use]
    pub fn suffix(self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        self.finisher(move |payload| payload + &marker)
    }

    /// Sets the pacer used at every progress step.
    #[must_use]
    pub fn pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Arc::new(pacer);
        self
    }

    /// Sets the lifecycle sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the forwarding policy for phase 1.
    #[must_use]
    pub fn forward_policy(mut self, policy: ForwardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Invalid`] if the planner or either stage is
    /// missing.
    pub fn build(self) -> Result<Pipeline, CascadeError> {
        let planner = self
            .planner
            .ok_or_else(|| CascadeError::Invalid("no planner configured".to_owned()))?;
        let item_stage = self
            .item_stage
            .ok_or_else(|| CascadeError::Invalid("no per-item stage configured".to_owned()))?;
        let reduction_stage = self
            .reduction_stage
            .ok_or_else(|| CascadeError::Invalid("no reduction stage configured".to_owned()))?;

        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                name: self.name,
                planner,
                item_stage,
                reduction_stage,
                finisher: self.finisher,
                pacer: self.pacer,
                sink: self.sink,
                policy: self.policy,
            }),
        })
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("has_planner", &self.planner.is_some())
            .field("has_item_stage", &self.item_stage.is_some())
            .field("has_reduction_stage", &self.reduction_stage.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}
