//! Pipeline composition and execution.
//!
//! This module provides:
//! - The sequential [`Aggregator`] and its fold rule
//! - The two-phase [`Pipeline`] executor and its builder
//! - The per-run state machine

mod aggregator;
mod builder;
mod executor;
mod state;

pub use aggregator::{fold_payloads, Aggregator, ForwardPolicy};
pub use builder::PipelineBuilder;
pub use executor::{Finisher, Pipeline, PipelineOutput, Planner, ACCUMULATED_PARAM};
pub use state::RunState;
