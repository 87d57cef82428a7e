// orderflow/src/pipeline/mod.rs

//! A small async step pipeline. The order workflows are expressed as
//! pipelines of named steps sharing one [`ContextData`].

pub mod context_data;
pub mod control;
pub mod definition;
mod execution;

pub use context_data::ContextData;
pub use control::{PipelineOutcome, StepControl};
pub use definition::{Pipeline, StepDef, StepHandler};

use thiserror::Error;

/// Errors raised by the runner itself rather than by a step handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
  #[error("Pipeline '{pipeline}' has no handler for required step '{step_name}'")]
  HandlerMissing { pipeline: String, step_name: String },

  #[error("Pipeline '{pipeline}' stopped at step '{step}' without producing a result")]
  Incomplete { pipeline: String, step: String },
}
