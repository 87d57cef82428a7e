// tests/pipeline_tests.rs
mod common;

use common::setup_tracing;
use orderflow::{ContextData, Pipeline, PipelineError, PipelineOutcome, StepControl};
use serial_test::serial;

#[derive(Debug, Clone, Default)]
struct Trace {
  steps: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum TestError {
  #[error("pipeline: {0}")]
  Pipeline(#[from] PipelineError),
  #[error("handler failed: {0}")]
  Handler(String),
}

async fn record(ctx: ContextData<Trace>, name: &'static str) -> Result<StepControl, TestError> {
  ctx.write().steps.push(name.to_string());
  Ok(StepControl::Continue)
}

#[tokio::test]
#[serial]
async fn steps_run_in_declaration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("ordered", &[("a", false), ("b", false), ("c", false)]);
  pipeline.on_step("c", |ctx| record(ctx, "c"));
  pipeline.on_step("a", |ctx| record(ctx, "a"));
  pipeline.on_step("b", |ctx| record(ctx, "b"));

  let ctx = ContextData::new(Trace::default());
  let outcome = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, PipelineOutcome::Completed { skipped_failures: vec![] });
  assert_eq!(ctx.read().steps, vec!["a", "b", "c"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("stopping", &[("a", false), ("halt", false), ("c", false)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));
  pipeline.on_step("halt", |ctx: ContextData<Trace>| async move {
    ctx.write().steps.push("halt".into());
    Ok(StepControl::Stop)
  });
  pipeline.on_step("c", |ctx| record(ctx, "c"));

  let ctx = ContextData::new(Trace::default());
  let outcome = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, PipelineOutcome::Stopped { step: "halt".into() });
  assert!(!outcome.is_completed());
  assert_eq!(ctx.read().steps, vec!["a", "halt"]);
}

#[tokio::test]
#[serial]
async fn required_step_failure_aborts_the_run() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("failing", &[("a", false), ("bad", false), ("c", false)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));
  pipeline.on_step("bad", |_ctx: ContextData<Trace>| async move {
    Err::<StepControl, _>(TestError::Handler("boom".into()))
  });
  pipeline.on_step("c", |ctx| record(ctx, "c"));

  let ctx = ContextData::new(Trace::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("boom".into()));
  assert_eq!(ctx.read().steps, vec!["a"]);
}

#[tokio::test]
#[serial]
async fn optional_step_failure_is_skipped_and_reported() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("lenient", &[("a", false), ("flaky", true), ("c", false)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));
  pipeline.on_step("flaky", |_ctx: ContextData<Trace>| async move {
    Err::<StepControl, _>(TestError::Handler("transient".into()))
  });
  pipeline.on_step("c", |ctx| record(ctx, "c"));

  let ctx = ContextData::new(Trace::default());
  let outcome = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(
    outcome,
    PipelineOutcome::Completed {
      skipped_failures: vec!["flaky".into()]
    }
  );
  assert_eq!(ctx.read().steps, vec!["a", "c"]);
}

#[tokio::test]
#[serial]
async fn missing_required_handler_fails_before_any_step_runs() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("incomplete", &[("a", false), ("unbound", false)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));

  let ctx = ContextData::new(Trace::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(
    err,
    TestError::Pipeline(PipelineError::HandlerMissing {
      pipeline: "incomplete".into(),
      step_name: "unbound".into(),
    })
  );
  assert!(ctx.read().steps.is_empty());
}

#[tokio::test]
#[serial]
async fn optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("sparse", &[("a", false), ("maybe", true)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));

  let ctx = ContextData::new(Trace::default());
  let outcome = pipeline.run(ctx.clone()).await.unwrap();

  assert!(outcome.is_completed());
  assert!(!pipeline.has_handler("maybe"));
  assert_eq!(ctx.read().steps, vec!["a"]);
}

#[tokio::test]
#[serial]
async fn binding_an_undeclared_step_appends_it_as_required() {
  setup_tracing();
  let mut pipeline = Pipeline::<Trace, TestError>::new("growing", &[("a", false)]);
  pipeline.on_step("a", |ctx| record(ctx, "a"));
  pipeline.on_step("late", |ctx| record(ctx, "late"));

  let names: Vec<_> = pipeline.steps().iter().map(|s| (s.name.as_str(), s.optional)).collect();
  assert_eq!(names, vec![("a", false), ("late", false)]);
  assert_eq!(pipeline.name(), "growing");

  let ctx = ContextData::new(Trace::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.into_inner().steps, vec!["a", "late"]);
}
