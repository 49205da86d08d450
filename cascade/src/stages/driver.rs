//! The single execution path for one stage invocation.
//!
//! Both execution modes and both pipeline phases funnel through
//! [`drive_stage`]. It walks the declared progress labels, pausing at each
//! one through the pacer and forwarding a progress event through the relay,
//! then computes the final payload exactly once. There is no eager shortcut:
//! an eager run is this same walk with a discarding relay.

use crate::cancellation::CancellationToken;
use crate::errors::CascadeError;
use crate::events::{
    ChannelRelay, DiscardRelay, EventKind, EventRelay, EventStream, PipelineEvent, RelayClosed,
};
use crate::stages::{Pacer, Stage, StageInput};
use futures::channel::mpsc;
use std::sync::Arc;
use tracing::debug;

/// Why a drive loop stopped before producing its final payload.
#[derive(Debug)]
pub enum RunInterrupt {
    /// The streaming consumer stopped reading. Not an error; the producer
    /// simply has no one left to talk to and stops quietly.
    ConsumerGone,
    /// The run failed (stage failure, cancellation, broken invariant).
    Failed(CascadeError),
}

impl From<RelayClosed> for RunInterrupt {
    fn from(_: RelayClosed) -> Self {
        Self::ConsumerGone
    }
}

impl From<CascadeError> for RunInterrupt {
    fn from(err: CascadeError) -> Self {
        Self::Failed(err)
    }
}

/// Drives one stage invocation through a relay and returns its final payload.
///
/// `scope` tags the emitted events; `final_kind` picks the kind of the final
/// event; `forward_final` controls whether the final event goes through the
/// relay at all (the pipeline withholds the reduction final so it can rewrite
/// it in place).
pub(crate) async fn drive_stage(
    stage: &dyn Stage,
    input: &StageInput,
    scope: Option<&str>,
    final_kind: EventKind,
    forward_final: bool,
    relay: &mut dyn EventRelay,
    pacer: &dyn Pacer,
    cancel: &CancellationToken,
) -> Result<String, RunInterrupt> {
    let labels = stage.progress_labels(input);
    debug!(
        stage = stage.id(),
        input = %input.id,
        steps = labels.len(),
        "driving stage"
    );

    let mut collected = Vec::with_capacity(labels.len());
    for label in labels {
        pacer.pause(cancel).await?;
        relay
            .forward(PipelineEvent {
                kind: EventKind::Progress,
                scope: scope.map(ToOwned::to_owned),
                data: label.clone(),
            })
            .await?;
        collected.push(label);
    }

    let payload = stage
        .finalize(input, &collected)
        .map_err(CascadeError::from)?;

    if forward_final {
        relay
            .forward(PipelineEvent {
                kind: final_kind,
                scope: scope.map(ToOwned::to_owned),
                data: payload.clone(),
            })
            .await?;
    }

    debug!(stage = stage.id(), input = %input.id, "stage finished");
    Ok(payload)
}

/// The polymorphic output of a standalone stage run.
pub enum StageExecution {
    /// Streaming variant: a lazy event sequence ending with the stage's
    /// final event.
    Stream(EventStream),
    /// Eager variant: just the final event; progress happened internally and
    /// was not observable.
    Final(PipelineEvent),
}

impl std::fmt::Debug for StageExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("StageExecution::Stream(..)"),
            Self::Final(event) => f.debug_tuple("StageExecution::Final").field(event).finish(),
        }
    }
}

/// Runs a single stage outside of any pipeline.
///
/// The streaming variant returns immediately; the walk runs in a spawned
/// task and suspends at every event until the consumer reads it. The eager
/// variant performs the identical walk internally, discarding progress
/// events, and resolves to the final event.
///
/// Events are scoped to the input's id and the final event has kind
/// [`EventKind::StageFinal`].
pub async fn run_stage(
    stage: Arc<dyn Stage>,
    input: StageInput,
    streaming: bool,
    pacer: Arc<dyn Pacer>,
    cancel: CancellationToken,
) -> Result<StageExecution, CascadeError> {
    if streaming {
        let (tx, rx) = mpsc::channel(0);
        tokio::spawn(async move {
            let mut relay = ChannelRelay::new(tx);
            let scope = input.id.clone();
            match drive_stage(
                stage.as_ref(),
                &input,
                Some(scope.as_str()),
                EventKind::StageFinal,
                true,
                &mut relay,
                pacer.as_ref(),
                &cancel,
            )
            .await
            {
                Ok(_) | Err(RunInterrupt::ConsumerGone) => {}
                Err(RunInterrupt::Failed(err)) => relay.fail(err).await,
            }
        });
        return Ok(StageExecution::Stream(rx));
    }

    let mut relay = DiscardRelay;
    let scope = input.id.clone();
    match drive_stage(
        stage.as_ref(),
        &input,
        Some(&scope),
        EventKind::StageFinal,
        true,
        &mut relay,
        pacer.as_ref(),
        &cancel,
    )
    .await
    {
        Ok(payload) => Ok(StageExecution::Final(PipelineEvent::stage_final(
            scope, payload,
        ))),
        Err(RunInterrupt::Failed(err)) => Err(err),
        Err(RunInterrupt::ConsumerGone) => Err(CascadeError::InvariantViolation(
            "discarding relay reported a closed consumer".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{BlueprintStage, NoopPacer};
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    fn counting_stage() -> Arc<dyn Stage> {
        Arc::new(BlueprintStage::with_labels(
            "count",
            vec!["a".into(), "b".into(), "c".into()],
            |input, progress| Ok(format!("{} saw {} steps", input.id, progress.len())),
        ))
    }

    #[tokio::test]
    async fn test_streaming_run_yields_progress_then_final() {
        let execution = run_stage(
            counting_stage(),
            StageInput::new("item_1"),
            true,
            Arc::new(NoopPacer),
            CancellationToken::new(),
        )
        .await
        .expect("streaming run starts");

        let StageExecution::Stream(stream) = execution else {
            panic!("expected streaming variant");
        };
        let events: Vec<_> = stream
            .map(|item| item.expect("no error expected"))
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert!(events[..3].iter().all(|e| e.kind == EventKind::Progress));
        assert_eq!(events[3].kind, EventKind::StageFinal);
        assert_eq!(events[3].data, "item_1 saw 3 steps");
        assert!(events.iter().all(|e| e.scope.as_deref() == Some("item_1")));
    }

    #[tokio::test]
    async fn test_eager_run_matches_streaming_final() {
        let execution = run_stage(
            counting_stage(),
            StageInput::new("item_1"),
            false,
            Arc::new(NoopPacer),
            CancellationToken::new(),
        )
        .await
        .expect("eager run completes");

        let StageExecution::Final(event) = execution else {
            panic!("expected eager variant");
        };
        assert_eq!(event, PipelineEvent::stage_final("item_1", "item_1 saw 3 steps"));
    }

    #[tokio::test]
    async fn test_failure_terminates_stream() {
        let stage: Arc<dyn Stage> = Arc::new(BlueprintStage::with_labels(
            "broken",
            vec!["only step".into()],
            |input, _| Err(crate::errors::StageError::new(&input.id, "no backend")),
        ));

        let execution = run_stage(
            stage,
            StageInput::new("item_9"),
            true,
            Arc::new(NoopPacer),
            CancellationToken::new(),
        )
        .await
        .expect("streaming run starts");

        let StageExecution::Stream(mut stream) = execution else {
            panic!("expected streaming variant");
        };

        let first = stream.next().await.expect("progress event");
        assert_eq!(first.expect("progress is ok").kind, EventKind::Progress);

        let second = stream.next().await.expect("terminal error");
        assert!(matches!(second, Err(CascadeError::Stage(_))));

        assert!(stream.next().await.is_none(), "nothing after the error");
    }

    #[tokio::test]
    async fn test_cancelled_eager_run_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel("test shutdown");

        let result = run_stage(
            counting_stage(),
            StageInput::new("item_1"),
            false,
            Arc::new(NoopPacer),
            cancel,
        )
        .await;

        assert_eq!(
            result.expect_err("run should abort"),
            CascadeError::Aborted("test shutdown".into())
        );
    }
}
