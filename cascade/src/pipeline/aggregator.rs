//! Sequential phase driver and fold.

use crate::cancellation::CancellationToken;
use crate::errors::CascadeError;
use crate::events::{EventKind, EventRelay, EventSink, LifecycleNotice};
use crate::stages::{drive_stage, Pacer, RunInterrupt, Stage, StageInput};
use std::sync::Arc;

/// How the aggregator forwards the events of the stages it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardPolicy {
    /// Forward every event, progress and final alike; consumers filter by
    /// kind. The default: it keeps the aggregator ignorant of the event
    /// taxonomy.
    #[default]
    Everything,
    /// Forward only progress events; finals are captured but withheld from
    /// the outward stream.
    ProgressOnly,
}

/// Drives an ordered list of same-kind stage invocations through one relay.
///
/// Invocations run strictly sequentially, in list order. Progress events are
/// forwarded as produced; final payloads are captured for the caller to fold.
/// The aggregator never emits a synthetic event of its own and never
/// continues past a failure.
pub struct Aggregator {
    policy: ForwardPolicy,
    sink: Arc<dyn EventSink>,
    pacer: Arc<dyn Pacer>,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(policy: ForwardPolicy, sink: Arc<dyn EventSink>, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            policy,
            sink,
            pacer,
        }
    }

    /// Runs `stage` once per input, in order, and returns the captured final
    /// payloads.
    ///
    /// `final_kind` is the kind used for each invocation's final event;
    /// `scoped` tags events with the input id (per-item phase) or leaves them
    /// unscoped (reduction phase).
    pub async fn run_all(
        &self,
        stage: &dyn Stage,
        inputs: &[StageInput],
        final_kind: EventKind,
        scoped: bool,
        relay: &mut dyn EventRelay,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RunInterrupt> {
        let mut payloads = Vec::with_capacity(inputs.len());

        for (position, input) in inputs.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CascadeError::aborted_by(cancel).into());
            }

            self.sink
                .notify(&LifecycleNotice::stage_started(stage.id(), &input.id, position));

            let scope = scoped.then_some(input.id.as_str());
            let forward_final = self.policy == ForwardPolicy::Everything;
            let payload = drive_stage(
                stage,
                input,
                scope,
                final_kind,
                forward_final,
                relay,
                self.pacer.as_ref(),
                cancel,
            )
            .await?;
            payloads.push(payload);
        }

        Ok(payloads)
    }
}

/// Folds captured per-item final payloads into the reduction accumulator.
///
/// Each payload is appended verbatim followed by a single space; nothing is
/// trimmed. The trailing separator is part of the contract.
#[must_use]
pub fn fold_payloads(payloads: &[String]) -> String {
    let mut accumulated = String::new();
    for payload in payloads {
        accumulated.push_str(payload);
        accumulated.push(' ');
    }
    accumulated
}
