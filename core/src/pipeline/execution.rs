// shopflow/src/pipeline/execution.rs

use crate::core::context_data::FlowContext;
use crate::core::control::{RunOutcome, StepControl};
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::pipeline::definition::{Phase, Pipeline};
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// Required steps without handlers fail with [`FlowError::MissingHandler`]
  /// (converted into `E`). A failing handler inside an optional step is
  /// logged and the run moves on to the next step.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<T>(), steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: FlowContext<T>) -> Result<RunOutcome, E> {
    debug!("pipeline run starting");

    for (index, step) in self.steps.iter().enumerate() {
      let span = info_span!("step", name = %step.name, index, optional = step.optional);
      if let StepControl::Halt = self.run_step(step, &ctx).instrument(span).await? {
        return Ok(RunOutcome::Halted);
      }
    }

    debug!("pipeline run completed");
    Ok(RunOutcome::Completed)
  }

  async fn run_step(&self, step: &StepDef<T>, ctx: &FlowContext<T>) -> Result<StepControl, E> {
    if step.should_skip(&ctx.read()) {
      debug!("step skipped by condition");
      return Ok(StepControl::Continue);
    }

    let Some(hooks) = self.hooks.get(&step.name).filter(|h| !h.is_empty()) else {
      if step.optional {
        debug!("optional step has no handlers");
        return Ok(StepControl::Continue);
      }
      error!("required step has no handlers");
      return Err(E::from(FlowError::MissingHandler {
        step: step.name.clone(),
      }));
    };

    for phase in Phase::ALL {
      for (handler_index, handler) in hooks.slot(phase).iter().enumerate() {
        trace!(%phase, handler_index, "running handler");
        match handler(ctx.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Halt) => {
            info!(%phase, handler_index, "run halted by handler");
            return Ok(StepControl::Halt);
          }
          Err(err) if step.optional => {
            warn!(%phase, handler_index, error = %err, "optional step failed, continuing");
            return Ok(StepControl::Continue);
          }
          Err(err) => {
            error!(%phase, handler_index, error = %err, "handler failed");
            return Err(err);
          }
        }
      }
    }

    Ok(StepControl::Continue)
  }
}
