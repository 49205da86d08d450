//! Per-run state machine.

use crate::errors::CascadeError;

/// The phases a single pipeline run moves through.
///
/// Transitions only go forward; a run never re-enters an earlier phase (no
/// in-run retry). `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The run has not begun.
    NotStarted,
    /// Phase 1: the per-item stage list is executing.
    RunningItems,
    /// Phase 2: the reduction stage is executing.
    RunningReduction,
    /// The finishing transform is being applied.
    Finishing,
    /// The run completed and the terminal event was produced.
    Done,
    /// The run ended early on stage failure or cancellation.
    Failed,
}

impl RunState {
    /// Returns true for states no run leaves again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Moves to `next`, or reports an [`CascadeError::InvariantViolation`]
    /// for an illegal transition.
    pub fn advance(self, next: Self) -> Result<Self, CascadeError> {
        let legal = matches!(
            (self, next),
            (Self::NotStarted, Self::RunningItems)
                | (Self::RunningItems, Self::RunningReduction)
                | (Self::RunningReduction, Self::Finishing)
                | (Self::Finishing, Self::Done)
        ) || (!self.is_terminal() && next == Self::Failed);

        if legal {
            Ok(next)
        } else {
            Err(CascadeError::InvariantViolation(format!(
                "illegal run state transition {self:?} -> {next:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = RunState::NotStarted
            .advance(RunState::RunningItems)
            .and_then(|s| s.advance(RunState::RunningReduction))
            .and_then(|s| s.advance(RunState::Finishing))
            .and_then(|s| s.advance(RunState::Done))
            .expect("happy path is legal");
        assert_eq!(state, RunState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failure_reachable_from_any_non_terminal_state() {
        for state in [
            RunState::NotStarted,
            RunState::RunningItems,
            RunState::RunningReduction,
            RunState::Finishing,
        ] {
            assert_eq!(state.advance(RunState::Failed), Ok(RunState::Failed));
        }
    }

    #[test]
    fn test_no_reentry() {
        let err = RunState::RunningReduction
            .advance(RunState::RunningItems)
            .expect_err("going backwards is illegal");
        assert!(matches!(err, CascadeError::InvariantViolation(_)));
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(RunState::Done.advance(RunState::Failed).is_err());
        assert!(RunState::Failed.advance(RunState::Failed).is_err());
        assert!(RunState::Done.advance(RunState::RunningItems).is_err());
    }

    #[test]
    fn test_no_skipping_phases() {
        assert!(RunState::NotStarted.advance(RunState::Finishing).is_err());
        assert!(RunState::RunningItems.advance(RunState::Done).is_err());
    }
}
