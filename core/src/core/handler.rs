// shopflow/src/core/handler.rs

use crate::core::context_data::FlowContext;
use crate::core::control::StepControl;
use std::future::Future;
use std::pin::Pin;

/// Boxed future produced by a step handler.
pub type StepFuture<E> = Pin<Box<dyn Future<Output = Result<StepControl, E>> + Send>>;

/// A step handler: receives a handle to the shared context and resolves to a
/// [`StepControl`] or the pipeline's error type.
///
/// Handlers copy what they need out of the context, drop the guard, do their
/// async work, then take a write guard to store results.
pub type Handler<T, E> = Box<dyn Fn(FlowContext<T>) -> StepFuture<E> + Send + Sync>;
