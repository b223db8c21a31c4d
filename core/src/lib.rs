// src/lib.rs

//! shopflow: small async step pipelines for storefront workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step carries
//! `before`, `on` and `after` handler lists that run against a shared
//! [`FlowContext`]. Handlers decide whether the run continues or halts.
//! Steps can be optional (missing handlers and handler failures are tolerated)
//! or skipped by a predicate over the context.
//!
//! A [`Conductor`] keeps one pipeline per context type, so callers only need
//! to build the context and hand it over.
//!
//! ```ignore
//! let mut p = Pipeline::<CheckoutCtx, AppError>::new([
//!   StepDef::required("create_order_draft"),
//!   StepDef::required("create_payment_intent"),
//!   StepDef::optional("send_confirmation"),
//! ]);
//! p.on("create_order_draft", |ctx| Box::pin(async move { /* ... */ Ok::<_, AppError>(StepControl::Continue) }));
//! conductor.register(p);
//! conductor.run(FlowContext::new(ctx)).await?;
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::FlowContext;
pub use crate::core::control::{RunOutcome, StepControl};
pub use crate::core::handler::{Handler, StepFuture};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::{Phase, Pipeline};

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Conductor;
