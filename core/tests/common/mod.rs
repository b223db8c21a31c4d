// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use shopflow::{FlowContext, FlowError, Handler, StepControl};
use tracing::Level;

/// Context shaped like a tiny checkout: handlers append to `trail` and bump `total`.
#[derive(Clone, Debug, Default)]
pub struct CheckoutCtx {
  pub total: i64,
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
  pub express: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine: {0}")]
  Flow(String),

  #[error("handler: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records `label` in the trail, adds `amount`, and halts if `halt_at` names this label.
pub fn recording_handler(label: &'static str, amount: i64) -> Handler<CheckoutCtx, TestError> {
  Box::new(move |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.total += amount;
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", %label, total = guard.total, "recorded");
      if guard.halt_at.as_deref() == Some(label) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn failing_handler(label: &'static str, message: &'static str) -> Handler<CheckoutCtx, TestError> {
  Box::new(move |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
