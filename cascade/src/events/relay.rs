//! The event relay capability.
//!
//! The executor has exactly one code path for producing events. What makes a
//! run "streaming" or "eager" is which relay that code path is handed: a
//! [`ChannelRelay`] hands events to a live consumer, a [`DiscardRelay`]
//! drops them. Final payloads are computed the same way either way, so mode
//! equivalence holds by construction.

use crate::errors::CascadeError;
use crate::events::PipelineEvent;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::SinkExt;
use thiserror::Error;

/// Error returned by a relay whose consumer went away.
///
/// This is not a failure: it means nobody is listening anymore, and the
/// executor should stop producing rather than raise an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event consumer disconnected")]
pub struct RelayClosed;

/// Where a run's events go.
#[async_trait]
pub trait EventRelay: Send {
    /// Forwards one event toward the consumer.
    ///
    /// Suspends until the consumer has room for it; returns [`RelayClosed`]
    /// once the consumer has stopped reading.
    async fn forward(&mut self, event: PipelineEvent) -> Result<(), RelayClosed>;
}

/// Relay backed by an unbuffered channel to a live consumer.
pub struct ChannelRelay {
    tx: mpsc::Sender<Result<PipelineEvent, CascadeError>>,
}

impl std::fmt::Debug for ChannelRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRelay").finish_non_exhaustive()
    }
}

impl ChannelRelay {
    /// Creates a relay around the sending half of an event channel.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Result<PipelineEvent, CascadeError>>) -> Self {
        Self { tx }
    }

    /// Delivers a terminal error to the consumer.
    ///
    /// Best-effort: if the consumer is already gone the error is dropped,
    /// which is fine because nobody is listening.
    pub async fn fail(&mut self, error: CascadeError) {
        let _ = self.tx.send(Err(error)).await;
    }
}

#[async_trait]
impl EventRelay for ChannelRelay {
    async fn forward(&mut self, event: PipelineEvent) -> Result<(), RelayClosed> {
        self.tx.send(Ok(event)).await.map_err(|_| RelayClosed)
    }
}

/// Relay that discards every event; backs eager (non-streaming) execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardRelay;

#[async_trait]
impl EventRelay for DiscardRelay {
    async fn forward(&mut self, _event: PipelineEvent) -> Result<(), RelayClosed> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_discard_relay_accepts_everything() {
        let mut relay = DiscardRelay;
        for i in 0..10 {
            relay
                .forward(PipelineEvent::reduction_progress(format!("tick {i}")))
                .await
                .expect("discard relay never closes");
        }
    }

    #[tokio::test]
    async fn test_channel_relay_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(0);
        let mut relay = ChannelRelay::new(tx);

        let producer = tokio::spawn(async move {
            relay
                .forward(PipelineEvent::progress("s1", "a"))
                .await
                .expect("consumer is alive");
            relay
                .forward(PipelineEvent::progress("s1", "b"))
                .await
                .expect("consumer is alive");
        });

        let first = rx.next().await.expect("first event").expect("no error");
        let second = rx.next().await.expect("second event").expect("no error");
        assert_eq!(first.data, "a");
        assert_eq!(second.data, "b");

        producer.await.expect("producer task panicked");
    }

    #[tokio::test]
    async fn test_channel_relay_reports_closed_consumer() {
        let (tx, rx) = mpsc::channel(0);
        let mut relay = ChannelRelay::new(tx);
        drop(rx);

        let result = relay.forward(PipelineEvent::progress("s1", "a")).await;
        assert_eq!(result, Err(RelayClosed));
    }

    #[tokio::test]
    async fn test_fail_delivers_terminal_error() {
        let (tx, mut rx) = mpsc::channel(0);
        let mut relay = ChannelRelay::new(tx);

        tokio::spawn(async move {
            relay.fail(CascadeError::Aborted("gone".into())).await;
        });

        let item = rx.next().await.expect("terminal item");
        assert_eq!(item, Err(CascadeError::Aborted("gone".into())));
        assert!(rx.next().await.is_none());
    }
}
