//! Injectable suspension points.
//!
//! Every progress step of every stage passes through a [`Pacer`] before its
//! event is emitted. The pacer stands in for real work: production hosts plug
//! in whatever waiting their stages actually do, demos use a fixed delay, and
//! tests use [`NoopPacer`] so runs complete instantly. The pacer is also
//! where cancellation is observed, so a cancelled run stops at the next
//! suspension point instead of sleeping through it.

use crate::cancellation::CancellationToken;
use crate::errors::CascadeError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// One unit of simulated work.
#[async_trait]
pub trait Pacer: Send + Sync + Debug {
    /// Pauses for one unit of work, or returns [`CascadeError::Aborted`] if
    /// the run was cancelled.
    async fn pause(&self, cancel: &CancellationToken) -> Result<(), CascadeError>;
}

/// A pacer that does not wait at all. The default, and what tests use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, cancel: &CancellationToken) -> Result<(), CascadeError> {
        if cancel.is_cancelled() {
            return Err(CascadeError::aborted_by(cancel));
        }
        Ok(())
    }
}

/// A pacer that sleeps a fixed duration per unit of work.
///
/// The sleep is raced against the cancellation token, so cancelling a run
/// wakes it immediately rather than after the remaining delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    /// Creates a pacer with the given per-step delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self, cancel: &CancellationToken) -> Result<(), CascadeError> {
        tokio::select! {
            () = tokio::time::sleep(self.delay) => {}
            () = cancel.cancelled() => {}
        }
        if cancel.is_cancelled() {
            return Err(CascadeError::aborted_by(cancel));
        }
        Ok(())
    }
}
