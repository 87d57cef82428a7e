// orderflow/src/pipeline/execution.rs

//! `Pipeline::run()`: executes steps in declaration order against one shared context.

use super::context_data::ContextData;
use super::control::{PipelineOutcome, StepControl};
use super::definition::Pipeline;
use super::PipelineError;
use tracing::{debug, error, info_span, instrument, warn, Instrument};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::fmt::Display + From<PipelineError> + Send + 'static,
{
  /// Runs every step in order.
  ///
  /// A required step without a handler is a configuration error and is
  /// reported as `Err::from(PipelineError::HandlerMissing)` before anything
  /// else runs. Optional steps without handlers are skipped.
  #[instrument(name = "Pipeline::run", skip_all, fields(pipeline = %self.name, num_steps = self.steps.len()))]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineOutcome, Err> {
    if let Some(missing) = self
      .steps
      .iter()
      .find(|s| !s.optional && !self.handlers.contains_key(&s.name))
    {
      error!(step = %missing.name, "Required step has no handler.");
      return Err(Err::from(PipelineError::HandlerMissing {
        pipeline: self.name.clone(),
        step_name: missing.name.clone(),
      }));
    }

    let mut skipped_failures = Vec::new();

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let Some(handler) = self.handlers.get(&step_def.name) else {
        debug!(step = %step_def.name, "Optional step has no handler, skipping.");
        continue;
      };

      let step_span = info_span!(
        "pipeline_step",
        step = %step_def.name,
        step_index,
        optional = step_def.optional
      );

      match handler(ctx_data.clone()).instrument(step_span).await {
        Ok(StepControl::Continue) => {
          debug!(step = %step_def.name, "Step finished.");
        }
        Ok(StepControl::Stop) => {
          debug!(step = %step_def.name, "Pipeline stopped by step.");
          return Ok(PipelineOutcome::Stopped {
            step: step_def.name.clone(),
          });
        }
        Err(e) if step_def.optional => {
          warn!(step = %step_def.name, error = %e, "Optional step failed; continuing.");
          skipped_failures.push(step_def.name.clone());
        }
        Err(e) => {
          error!(step = %step_def.name, error = %e, "Step failed.");
          return Err(e);
        }
      }
    }

    Ok(PipelineOutcome::Completed { skipped_failures })
  }
}
