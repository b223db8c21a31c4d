// shopflow/src/error.rs
use thiserror::Error;

/// Errors raised by the engine itself, as opposed to errors returned by
/// application handlers.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step}")]
  UnknownStep { step: String },

  #[error("Step already defined: {step}")]
  DuplicateStep { step: String },

  #[error("Required step '{step}' has no handlers")]
  MissingHandler { step: String },

  #[error("No pipeline registered for context type {context_type}")]
  Unregistered { context_type: String },

  #[error("Context handed to the registry was not a {expected}")]
  ContextMismatch { expected: String },

  #[error("Handler failed: {0}")]
  Handler(#[from] anyhow::Error),
}

impl FlowError {
  /// Name of the step the error refers to, when there is one.
  pub fn step(&self) -> Option<&str> {
    match self {
      FlowError::UnknownStep { step } | FlowError::DuplicateStep { step } | FlowError::MissingHandler { step } => {
        Some(step)
      }
      _ => None,
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
