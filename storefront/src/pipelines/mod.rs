// storefront/src/pipelines/mod.rs

//! Multi-step workflows, one pipeline per context type.

use crate::errors::AppError;
use shopflow::Conductor;
use std::sync::Arc;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod login_pipeline;
pub mod payment_webhook_pipeline;
pub mod register_pipeline;
pub mod send_email_pipeline;

/// Registers every pipeline. Called once while building `AppState`.
pub fn register_all_pipelines(conductor: &Arc<Conductor<AppError>>) {
  register_pipeline::register_register_pipeline(conductor);
  login_pipeline::register_login_pipeline(conductor);
  cart_pipeline::register_add_to_cart_pipeline(conductor);
  checkout_pipeline::register_checkout_pipeline(conductor);
  payment_webhook_pipeline::register_payment_webhook_pipeline(conductor);
  send_email_pipeline::register_send_email_pipeline(conductor);

  tracing::info!(pipelines = conductor.len(), "Application pipelines registered.");
}
