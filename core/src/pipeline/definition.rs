// orderflow/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` type: an ordered list of named steps, each
//! bound to at most one async handler.

use super::context_data::ContextData;
use super::control::StepControl;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed future produced by a step handler.
pub type StepFuture<Err> = Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>;

/// A step handler. It receives a clone of the run's shared context.
pub type StepHandler<TData, Err> = Box<dyn Fn(ContextData<TData>) -> StepFuture<Err> + Send + Sync>;

/// Name and optionality of one step.
///
/// A failing optional step is logged and skipped; a failing required step
/// aborts the run with the handler's error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

pub struct Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef>,
  pub(crate) handlers: HashMap<String, StepHandler<TData, Err>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: Send + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in execution order.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool)]) -> Self {
    Self {
      name: name.into(),
      steps: step_defs
        .iter()
        .map(|(step, optional)| StepDef {
          name: (*step).to_string(),
          optional: *optional,
        })
        .collect(),
      handlers: HashMap::new(),
    }
  }

  /// Binds `handler` to `step_name`, replacing any previous handler.
  ///
  /// A name that is not yet declared is appended as a required step.
  pub fn on_step<F, Fut>(&mut self, step_name: &str, handler: F) -> &mut Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, Err>> + Send + 'static,
  {
    if !self.steps.iter().any(|s| s.name == step_name) {
      self.steps.push(StepDef {
        name: step_name.to_string(),
        optional: false,
      });
    }
    self
      .handlers
      .insert(step_name.to_string(), Box::new(move |ctx| Box::pin(handler(ctx))));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  pub fn has_handler(&self, step_name: &str) -> bool {
    self.handlers.contains_key(step_name)
  }
}
