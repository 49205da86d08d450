//! Testing utilities.
//!
//! The executor makes mode equivalence hold by construction, but a stage
//! whose finalize function is not deterministic can still break it. The
//! harness here runs a pipeline in both modes and diffs the terminal
//! payloads, which is the only way that class of bug is detectable.

mod assertions;

pub use assertions::{assert_mode_equivalence, terminal_of_stream};
