// shopflow/src/pipeline/definition.rs

//! Pipeline layout: the ordered steps and the handlers attached to each one.

use crate::core::handler::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;
use std::fmt;

/// The three handler slots of a step, executed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    };
    f.write_str(label)
  }
}

pub(crate) struct StepHooks<T: 'static + Send + Sync, E> {
  pub(crate) before: Vec<Handler<T, E>>,
  pub(crate) on: Vec<Handler<T, E>>,
  pub(crate) after: Vec<Handler<T, E>>,
}

impl<T: 'static + Send + Sync, E> StepHooks<T, E> {
  fn empty() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }

  pub(crate) fn slot(&self, phase: Phase) -> &[Handler<T, E>] {
    match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  pub(crate) fn slot_mut(&mut self, phase: Phase) -> &mut Vec<Handler<T, E>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }
}

/// An ordered list of named steps run against a `FlowContext<T>`.
///
/// `E` is the error type handlers resolve to. It must absorb [`FlowError`] so
/// that engine failures (e.g. a required step without handlers) come out of
/// [`Pipeline::run`] in the same type.
pub struct Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) hooks: HashMap<String, StepHooks<T, E>>,
}

impl<T, E> Pipeline<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from its step definitions.
  ///
  /// # Panics
  /// If two steps share a name.
  pub fn new(steps: impl IntoIterator<Item = StepDef<T>>) -> Self {
    let mut pipeline = Self {
      steps: Vec::new(),
      hooks: HashMap::new(),
    };
    for step in steps {
      if pipeline.has_step(&step.name) {
        panic!("shopflow setup error: step '{}' is declared twice", step.name);
      }
      pipeline.steps.push(step);
    }
    pipeline
  }

  pub fn has_step(&self, name: &str) -> bool {
    self.steps.iter().any(|s| s.name == name)
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn step(&self, name: &str) -> Option<&StepDef<T>> {
    self.steps.iter().find(|s| s.name == name)
  }

  pub fn handler_count(&self, name: &str, phase: Phase) -> usize {
    self.hooks.get(name).map_or(0, |h| h.slot(phase).len())
  }

  fn position(&self, name: &str) -> FlowResult<usize> {
    self
      .steps
      .iter()
      .position(|s| s.name == name)
      .ok_or_else(|| FlowError::UnknownStep { step: name.to_string() })
  }

  fn check_new_name(&self, step: &StepDef<T>) -> FlowResult<()> {
    if self.has_step(&step.name) {
      return Err(FlowError::DuplicateStep {
        step: step.name.clone(),
      });
    }
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, step: StepDef<T>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.check_new_name(&step)?;
    self.steps.insert(idx, step);
    Ok(())
  }

  pub fn insert_after(&mut self, existing: &str, step: StepDef<T>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.check_new_name(&step)?;
    self.steps.insert(idx + 1, step);
    Ok(())
  }

  /// Removes a step together with every handler attached to it.
  pub fn remove_step(&mut self, name: &str) -> FlowResult<StepDef<T>> {
    let idx = self.position(name)?;
    self.hooks.remove(name);
    Ok(self.steps.remove(idx))
  }

  pub fn set_optional(&mut self, name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.position(name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn set_skip_condition(&mut self, name: &str, skip_if: Option<SkipCondition<T>>) -> FlowResult<()> {
    let idx = self.position(name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }

  /// Handler slots for `name`, created on first use.
  ///
  /// # Panics
  /// If the step does not exist. Attaching handlers to a misspelled step is a
  /// wiring bug that should surface at startup.
  pub(crate) fn hooks_mut(&mut self, name: &str) -> &mut StepHooks<T, E> {
    if !self.has_step(name) {
      panic!("shopflow setup error: cannot attach a handler to unknown step '{}'", name);
    }
    self.hooks.entry(name.to_string()).or_insert_with(StepHooks::empty)
  }
}
