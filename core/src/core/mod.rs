pub mod context_data;
pub mod control;
pub mod handler;
pub mod step;

pub use context_data::FlowContext;
pub use control::{RunOutcome, StepControl};
pub use handler::{Handler, StepFuture};
pub use step::{SkipCondition, StepDef};
