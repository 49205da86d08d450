//! # Cascade
//!
//! A minimal multi-stage pipeline executor with a dual-mode execution
//! contract: every run can either stream its progress events live or run
//! silently to a single result, and the terminal payload is byte-identical
//! either way because both modes share one code path.
//!
//! A pipeline is two phases plus a transform:
//!
//! - **Phase 1**: a per-item [`Stage`](stages::Stage) runs once per planned
//!   input, strictly in order, emitting progress events then a final event.
//! - **Fold**: the per-item final payloads are concatenated into one
//!   accumulator.
//! - **Phase 2**: a reduction stage runs once over the accumulator.
//! - **Finish**: an injected transform rewrites the terminal payload, which
//!   is emitted as the run's last event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cascade::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("qa")
//!     .planner(plan_steps)
//!     .item_stage(answer_stage())
//!     .reduction_stage(reformat_stage())
//!     .suffix("ref:1")
//!     .build()?;
//!
//! // Streaming:
//! let mut stream = pipeline.execute_streaming("Explain quantum physics", CancellationToken::new());
//! while let Some(event) = stream.next().await { /* render */ }
//!
//! // Eager, same terminal payload:
//! let result = pipeline.execute_eager("Explain quantum physics", CancellationToken::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::errors::{CascadeError, StageError};
    pub use crate::events::{
        EventKind, EventSink, EventStream, NoOpEventSink, PipelineEvent, TracingEventSink,
    };
    pub use crate::pipeline::{
        fold_payloads, Aggregator, ForwardPolicy, Pipeline, PipelineBuilder, PipelineOutput,
        RunState, ACCUMULATED_PARAM,
    };
    pub use crate::stages::{
        run_stage, BlueprintStage, FixedDelayPacer, NoopPacer, Pacer, Stage, StageExecution,
        StageInput,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp};
}
