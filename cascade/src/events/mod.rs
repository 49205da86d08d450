//! Event model and event plumbing.
//!
//! This module provides:
//! - The outward-facing event record and its kind taxonomy
//! - The relay capability the executor emits events through
//! - Lifecycle sinks for observability (never for data flow)

mod event;
mod relay;
mod sink;

pub use event::{EventKind, EventStream, PipelineEvent};
pub use relay::{ChannelRelay, DiscardRelay, EventRelay, RelayClosed};
pub use sink::{
    CollectingEventSink, EventSink, LifecycleNotice, NoOpEventSink, TracingEventSink,
};
