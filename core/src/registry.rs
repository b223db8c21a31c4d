// shopflow/src/registry.rs

//! [`Conductor`]: one pipeline per context type, dispatched by `TypeId`.

use crate::core::context_data::FlowContext;
use crate::core::control::RunOutcome;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

#[async_trait]
trait ErasedPipeline<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  /// `ctx` must be a boxed `FlowContext<T>` for the pipeline's `T`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, E>;
}

struct Registered<T, HErr, E>
where
  T: 'static + Send + Sync,
  HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<T, HErr>,
  _app_err: PhantomData<fn() -> E>,
}

#[async_trait]
impl<T, HErr, E> ErasedPipeline<E> for Registered<T, HErr, E>
where
  T: 'static + Send + Sync,
  HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  E: std::error::Error + From<HErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, E> {
    let ctx = match ctx.downcast::<FlowContext<T>>() {
      Ok(ctx) => *ctx,
      Err(_) => {
        let expected = type_name::<FlowContext<T>>();
        error!(%expected, "context handed to registered pipeline has the wrong type");
        return Err(E::from(FlowError::ContextMismatch {
          expected: expected.to_string(),
        }));
      }
    };
    self.pipeline.run(ctx).await.map_err(E::from)
  }
}

/// Registry of pipelines keyed by context type.
///
/// `E` is what [`Conductor::run`] returns. Each registered pipeline's handler
/// error must convert into it.
pub struct Conductor<E = FlowError>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipelines: RwLock<HashMap<TypeId, Arc<dyn ErasedPipeline<E>>>>,
}

impl<E> Conductor<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` as the one to run for `FlowContext<T>`.
  /// Returns `true` when it replaced an earlier registration.
  pub fn register<T, HErr>(&self, pipeline: Pipeline<T, HErr>) -> bool
  where
    T: 'static + Send + Sync,
    HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    E: From<HErr>,
  {
    let entry: Arc<dyn ErasedPipeline<E>> = Arc::new(Registered::<T, HErr, E> {
      pipeline,
      _app_err: PhantomData,
    });
    let replaced = self.pipelines.write().insert(TypeId::of::<T>(), entry).is_some();
    if replaced {
      warn!(context_type = %type_name::<T>(), "pipeline registration replaced");
    } else {
      debug!(context_type = %type_name::<T>(), "pipeline registered");
    }
    replaced
  }

  pub fn is_registered<T: 'static>(&self) -> bool {
    self.pipelines.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.pipelines.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.pipelines.read().is_empty()
  }

  /// Runs the pipeline registered for `T` against `ctx`.
  #[instrument(name = "Conductor::run", skip_all, fields(context_type = %type_name::<T>()))]
  pub async fn run<T>(&self, ctx: FlowContext<T>) -> Result<RunOutcome, E>
  where
    T: 'static + Send + Sync,
  {
    let entry = self.pipelines.read().get(&TypeId::of::<T>()).cloned();
    let Some(entry) = entry else {
      error!("no pipeline registered for context type");
      return Err(E::from(FlowError::Unregistered {
        context_type: type_name::<T>().to_string(),
      }));
    };
    entry.run_erased(Box::new(ctx)).await
  }
}

impl<E> Default for Conductor<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
