// shopflow/src/core/control.rs

//! Flow signals returned by handlers and the overall result of a run.

/// What a handler wants the pipeline to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Stop the run right here. Remaining handlers and steps are not executed.
  Halt,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Every step ran (or was legitimately skipped).
  Completed,
  /// A handler returned [`StepControl::Halt`].
  Halted,
}

impl RunOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, RunOutcome::Completed)
  }
}
