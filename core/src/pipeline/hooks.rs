// shopflow/src/pipeline/hooks.rs

//! Handler registration for the before/on/after slots of a step.

use crate::core::context_data::FlowContext;
use crate::core::control::StepControl;
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::pipeline::definition::{Phase, Pipeline};
use std::future::Future;
use tracing::trace;

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Appends a handler to the `before` slot of `step`.
  pub fn before<F, HErr>(&mut self, step: &str, handler: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::Before, step, handler);
  }

  /// Appends a handler to the `on` slot of `step`.
  pub fn on<F, HErr>(&mut self, step: &str, handler: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::On, step, handler);
  }

  /// Appends a handler to the `after` slot of `step`.
  pub fn after<F, HErr>(&mut self, step: &str, handler: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    self.attach(Phase::After, step, handler);
  }

  /// Appends an already boxed handler, e.g. one shared between pipelines.
  pub fn attach_boxed(&mut self, phase: Phase, step: &str, handler: Handler<T, E>) {
    self.hooks_mut(step).slot_mut(phase).push(handler);
    trace!(%step, %phase, "handler attached");
  }

  fn attach<F, HErr>(&mut self, phase: Phase, step: &str, handler: impl Fn(FlowContext<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + 'static,
  {
    let boxed: Handler<T, E> = Box::new(move |ctx| {
      let fut = handler(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.attach_boxed(phase, step, boxed);
  }
}
