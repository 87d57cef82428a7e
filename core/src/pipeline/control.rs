// orderflow/src/pipeline/control.rs

//! Flow signals returned by step handlers and the outcome of a whole run.

/// Returned by a step handler to continue with the next step or halt the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
  /// Every step ran (optional steps may have failed and been skipped).
  Completed {
    /// Names of optional steps whose handler returned an error.
    skipped_failures: Vec<String>,
  },
  /// A handler returned [`StepControl::Stop`].
  Stopped { step: String },
}

impl PipelineOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, PipelineOutcome::Completed { .. })
  }
}
