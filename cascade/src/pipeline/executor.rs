//! The two-phase pipeline executor.
//!
//! A run plans a list of per-item inputs from the request, drives the
//! per-item stage over them (phase 1), folds the captured finals into one
//! accumulator, drives the reduction stage once over it (phase 2), applies
//! the finishing transform, and emits the terminal event. Streaming and
//! eager execution share this exact path; only the relay differs, which is
//! what makes the terminal payload byte-identical across modes.

use crate::cancellation::CancellationToken;
use crate::errors::CascadeError;
use crate::events::{
    ChannelRelay, DiscardRelay, EventKind, EventRelay, EventSink, EventStream, LifecycleNotice,
    PipelineEvent,
};
use crate::pipeline::state::RunState;
use crate::pipeline::{fold_payloads, Aggregator, ForwardPolicy};
use crate::stages::{Pacer, RunInterrupt, Stage, StageInput};
use crate::utils::generate_uuid;
use futures::channel::mpsc;
use std::sync::Arc;
use tracing::{debug, info};

/// Parameter key under which the reduction stage receives the folded
/// accumulator.
pub const ACCUMULATED_PARAM: &str = "accumulated";

/// Closure type planning the per-item inputs for a request.
pub type Planner = dyn Fn(&str) -> Vec<StageInput> + Send + Sync;

/// Closure type for the finishing transform applied to the terminal payload.
pub type Finisher = dyn Fn(String) -> String + Send + Sync;

/// The output of [`Pipeline::execute`].
pub enum PipelineOutput {
    /// Streaming mode: a live event stream.
    Stream(EventStream),
    /// Eager mode: the terminal event only.
    Final(PipelineEvent),
}

impl std::fmt::Debug for PipelineOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("PipelineOutput::Stream(..)"),
            Self::Final(event) => f.debug_tuple("PipelineOutput::Final").field(event).finish(),
        }
    }
}

pub(crate) struct PipelineInner {
    pub(crate) name: String,
    pub(crate) planner: Box<Planner>,
    pub(crate) item_stage: Arc<dyn Stage>,
    pub(crate) reduction_stage: Arc<dyn Stage>,
    pub(crate) finisher: Box<Finisher>,
    pub(crate) pacer: Arc<dyn Pacer>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) policy: ForwardPolicy,
}

/// A two-phase pipeline: N per-item stage invocations, a fold, one reduction
/// invocation, and a finishing transform.
///
/// Cheap to clone; clones share the same configuration. Each run owns its
/// own accumulator and event stream, so any number of runs may be in flight
/// concurrently.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) inner: Arc<PipelineInner>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.inner.name)
            .field("item_stage", &self.inner.item_stage.id())
            .field("reduction_stage", &self.inner.reduction_stage.id())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Executes the pipeline in the requested mode.
    ///
    /// Streaming mode resolves immediately with the event stream; any
    /// failure arrives as the stream's single terminal `Err`. Eager mode
    /// resolves once the run finishes, with the terminal event or the error.
    pub async fn execute(
        &self,
        request: &str,
        streaming: bool,
        cancel: CancellationToken,
    ) -> Result<PipelineOutput, CascadeError> {
        if streaming {
            Ok(PipelineOutput::Stream(
                self.execute_streaming(request, cancel),
            ))
        } else {
            Ok(PipelineOutput::Final(
                self.execute_eager(request, cancel).await?,
            ))
        }
    }

    /// Runs to completion without observable intermediate events.
    ///
    /// This is not a separate implementation: the run performs the same
    /// walk, pauses included, against a discarding relay.
    pub async fn execute_eager(
        &self,
        request: &str,
        cancel: CancellationToken,
    ) -> Result<PipelineEvent, CascadeError> {
        let mut relay = DiscardRelay;
        match self.drive(request, &mut relay, &cancel).await {
            Ok(event) => Ok(event),
            Err(RunInterrupt::Failed(err)) => Err(err),
            Err(RunInterrupt::ConsumerGone) => Err(CascadeError::InvariantViolation(
                "discarding relay reported a closed consumer".to_owned(),
            )),
        }
    }

    /// Starts a streaming run and returns its event stream.
    ///
    /// The run executes in a spawned task and suspends at each event until
    /// the consumer reads it, so output is delivered as produced. Dropping
    /// the stream stops the run at its next event: no further stages are
    /// invoked and no error is raised.
    pub fn execute_streaming(&self, request: &str, cancel: CancellationToken) -> EventStream {
        let (tx, rx) = mpsc::channel(0);
        let pipeline = self.clone();
        let request = request.to_owned();

        tokio::spawn(async move {
            let mut relay = ChannelRelay::new(tx);
            match pipeline.drive(&request, &mut relay, &cancel).await {
                Ok(_) => {}
                Err(RunInterrupt::ConsumerGone) => {
                    debug!(pipeline = %pipeline.inner.name, "consumer went away; run stopped");
                }
                Err(RunInterrupt::Failed(err)) => relay.fail(err).await,
            }
        });

        rx
    }

    /// The single code path both modes share.
    async fn drive(
        &self,
        request: &str,
        relay: &mut dyn EventRelay,
        cancel: &CancellationToken,
    ) -> Result<PipelineEvent, RunInterrupt> {
        let run_id = generate_uuid();
        info!(pipeline = %self.inner.name, %run_id, "run starting");

        let result = self.drive_phases(request, relay, cancel).await;

        let succeeded = result.is_ok();
        self.inner
            .sink
            .notify(&LifecycleNotice::run_finished(&run_id.to_string(), succeeded));
        match &result {
            Ok(event) => {
                info!(pipeline = %self.inner.name, %run_id, payload_len = event.data.len(), "run finished");
            }
            Err(RunInterrupt::ConsumerGone) => {
                debug!(pipeline = %self.inner.name, %run_id, "run stopped: consumer gone");
            }
            Err(RunInterrupt::Failed(err)) => {
                info!(pipeline = %self.inner.name, %run_id, error = %err, "run failed");
            }
        }

        result
    }

    async fn drive_phases(
        &self,
        request: &str,
        relay: &mut dyn EventRelay,
        cancel: &CancellationToken,
    ) -> Result<PipelineEvent, RunInterrupt> {
        let mut state = RunState::NotStarted;

        let inputs = (self.inner.planner)(request);
        state = state.advance(RunState::RunningItems).map_err(fail(&mut state))?;

        let item_aggregator = Aggregator::new(
            self.inner.policy,
            Arc::clone(&self.inner.sink),
            Arc::clone(&self.inner.pacer),
        );
        let payloads = item_aggregator
            .run_all(
                self.inner.item_stage.as_ref(),
                &inputs,
                EventKind::StageFinal,
                true,
                relay,
                cancel,
            )
            .await
            .map_err(fail(&mut state))?;

        let accumulated = fold_payloads(&payloads);
        state = state
            .advance(RunState::RunningReduction)
            .map_err(fail(&mut state))?;

        // The reduction final is withheld from the stream so the finishing
        // transform can rewrite it in place below.
        let reduction_aggregator = Aggregator::new(
            ForwardPolicy::ProgressOnly,
            Arc::clone(&self.inner.sink),
            Arc::clone(&self.inner.pacer),
        );
        let reduction_input = StageInput::new(self.inner.reduction_stage.id().to_owned())
            .with_param(ACCUMULATED_PARAM, serde_json::Value::String(accumulated));
        let finals = reduction_aggregator
            .run_all(
                self.inner.reduction_stage.as_ref(),
                std::slice::from_ref(&reduction_input),
                EventKind::ReductionFinal,
                false,
                relay,
                cancel,
            )
            .await
            .map_err(fail(&mut state))?;

        state = state.advance(RunState::Finishing).map_err(fail(&mut state))?;
        let raw = finals.into_iter().next().ok_or_else(|| {
            RunInterrupt::Failed(CascadeError::InvariantViolation(
                "reduction phase produced no payload".to_owned(),
            ))
        })?;

        let terminal = PipelineEvent::result((self.inner.finisher)(raw));
        relay.forward(terminal.clone()).await?;

        let _ = state.advance(RunState::Done).map_err(fail(&mut state))?;
        Ok(terminal)
    }
}

/// Marks the run failed while passing the original interrupt through.
fn fail<E: Into<RunInterrupt>>(state: &mut RunState) -> impl FnOnce(E) -> RunInterrupt + '_ {
    move |err| {
        if let Ok(next) = state.advance(RunState::Failed) {
            *state = next;
        }
        err.into()
    }
}
