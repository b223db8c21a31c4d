// tests/registry_tests.rs

mod common;

use common::*;
use serial_test::serial;
use shopflow::{Conductor, FlowContext, FlowError, Phase, Pipeline, RunOutcome, StepDef};

#[derive(Clone, Debug, Default)]
struct WebhookCtx {
  processed: bool,
}

fn checkout_pipeline(amount: i64) -> Pipeline<CheckoutCtx, TestError> {
  let mut pipeline = Pipeline::new([StepDef::required("create_order")]);
  pipeline.attach_boxed(Phase::On, "create_order", recording_handler("create_order", amount));
  pipeline
}

#[tokio::test]
#[serial]
async fn conductor_runs_pipeline_for_context_type() {
  setup_tracing();
  let conductor = Conductor::<TestError>::new();
  assert!(conductor.is_empty());
  assert!(!conductor.register(checkout_pipeline(7)));
  assert!(conductor.is_registered::<CheckoutCtx>());
  assert!(!conductor.is_registered::<WebhookCtx>());

  let ctx = FlowContext::new(CheckoutCtx::default());
  let outcome = conductor.run(ctx.clone()).await.unwrap();
  assert_eq!(outcome, RunOutcome::Completed);
  assert_eq!(ctx.read().total, 7);
}

#[tokio::test]
#[serial]
async fn conductor_dispatches_by_type() {
  setup_tracing();
  let conductor = Conductor::<TestError>::new();
  conductor.register(checkout_pipeline(1));

  let mut webhook = Pipeline::<WebhookCtx, TestError>::new([StepDef::required("apply")]);
  webhook.on("apply", |ctx: FlowContext<WebhookCtx>| async move {
    ctx.write().processed = true;
    Ok::<_, TestError>(shopflow::StepControl::Continue)
  });
  conductor.register(webhook);
  assert_eq!(conductor.len(), 2);

  let hook_ctx = FlowContext::new(WebhookCtx::default());
  conductor.run(hook_ctx.clone()).await.unwrap();
  assert!(hook_ctx.read().processed);
}

#[tokio::test]
#[serial]
async fn registering_twice_replaces_the_pipeline() {
  setup_tracing();
  let conductor = Conductor::<TestError>::new();
  conductor.register(checkout_pipeline(1));
  assert!(conductor.register(checkout_pipeline(50)));
  assert_eq!(conductor.len(), 1);

  let ctx = FlowContext::new(CheckoutCtx::default());
  conductor.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().total, 50);
}

#[tokio::test]
#[serial]
async fn unregistered_context_is_an_error() {
  setup_tracing();
  let conductor = Conductor::<FlowError>::new();
  let err = conductor.run(FlowContext::new(WebhookCtx::default())).await.unwrap_err();
  match err {
    FlowError::Unregistered { context_type } => assert!(context_type.contains("WebhookCtx")),
    other => panic!("unexpected error: {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn handler_errors_convert_into_conductor_error() {
  setup_tracing();
  let conductor = Conductor::<TestError>::new();
  let mut pipeline = Pipeline::<CheckoutCtx, TestError>::new([StepDef::required("charge")]);
  pipeline.attach_boxed(Phase::On, "charge", failing_handler("charge", "declined"));
  conductor.register(pipeline);

  let err = conductor.run(FlowContext::new(CheckoutCtx::default())).await.unwrap_err();
  assert_eq!(err, TestError::Handler("declined".into()));
}
