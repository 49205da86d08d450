//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is passed into every pipeline run. Stages never
//! poll it directly; the pacing layer checks it at every suspension point and
//! the aggregator checks it at stage boundaries.

mod token;

pub use token::CancellationToken;
