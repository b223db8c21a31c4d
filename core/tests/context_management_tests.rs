// tests/context_management_tests.rs

mod common;

use common::*;
use serial_test::serial;
use shopflow::{FlowContext, Pipeline, StepControl, StepDef};

#[test]
fn clones_share_the_same_data() {
  let ctx = FlowContext::new(CheckoutCtx::default());
  let other = ctx.clone();
  other.write().total = 42;
  assert_eq!(ctx.read().total, 42);
  assert_eq!(ctx.handle_count(), 2);
}

#[test]
fn mapped_guards_narrow_to_a_field() {
  let ctx = FlowContext::new(CheckoutCtx::default());
  ctx.map_write(|c| &mut c.trail).push("load_cart".to_string());
  let trail = ctx.map_read(|c| &c.trail);
  assert_eq!(trail.len(), 1);
}

#[test]
fn try_write_fails_while_read_guard_is_held() {
  let ctx = FlowContext::new(CheckoutCtx::default());
  let guard = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(guard);
  assert!(ctx.try_write().is_some());
}

#[test]
fn into_inner_requires_the_last_handle() {
  let ctx = FlowContext::new(CheckoutCtx {
    total: 3,
    ..Default::default()
  });
  let other = ctx.clone();
  let ctx = ctx.into_inner().expect_err("another handle is alive");
  drop(other);
  let data = ctx.into_inner().expect("last handle");
  assert_eq!(data.total, 3);
}

#[test]
fn snapshot_is_detached_from_later_writes() {
  let ctx: FlowContext<CheckoutCtx> = CheckoutCtx::default().into();
  let before = ctx.snapshot();
  ctx.write().total = 9;
  assert_eq!(before.total, 0);
  assert_eq!(ctx.snapshot().total, 9);
}

#[tokio::test]
#[serial]
async fn handlers_can_await_between_reads_and_writes() {
  setup_tracing();
  let mut pipeline = Pipeline::<CheckoutCtx, TestError>::new([StepDef::required("price")]);
  pipeline.on("price", |ctx: FlowContext<CheckoutCtx>| async move {
    let base = { ctx.read().total };
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ctx.write().total = base + 100;
    Ok::<_, TestError>(StepControl::Continue)
  });

  let ctx = FlowContext::new(CheckoutCtx {
    total: 1,
    ..Default::default()
  });
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().total, 101);
}
