// storefront/src/services/notification_service.rs

use crate::errors::{AppError, Result};
use crate::models::{NotificationLog, Order};
use crate::pipelines::contexts::SendEmailCtx;
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use shopflow::{FlowContext, RunOutcome};
use tracing::{instrument, warn};

/// Body of `POST /notifications/send-email`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
  #[serde(default)]
  pub to: String,
  pub subject: Option<String>,
  #[serde(default)]
  pub template: String,
  #[serde(default)]
  pub data: Value,
}

/// Renders and delivers one templated email through the send-email pipeline.
/// The returned log is `SENT`; delivery failures come back as errors after the
/// log was marked `FAILED`.
#[instrument(name = "notification_service::send", skip(state, request), fields(template = %request.template), err(Display))]
pub async fn send(state: &AppState, request: SendEmailRequest) -> Result<NotificationLog> {
  if request.to.trim().is_empty() || request.template.trim().is_empty() {
    return Err(AppError::validation("to and template are required"));
  }
  let ctx = FlowContext::new(SendEmailCtx::new(state.clone(), request));
  match state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let log = ctx.read().log.clone();
      log.ok_or_else(|| AppError::Internal("Email pipeline finished without a log entry".into()))
    }
    RunOutcome::Halted => Err(AppError::PipelineHalted),
  }
}

/// Sends without failing the caller. Problems are logged and dropped.
pub async fn send_best_effort(state: &AppState, to: &str, template: &str, data: Value) -> bool {
  let request = SendEmailRequest {
    to: to.to_string(),
    subject: None,
    template: template.to_string(),
    data,
  };
  match send(state, request).await {
    Ok(_) => true,
    Err(e) => {
      warn!(error = %e, %template, "Best-effort email was not sent.");
      false
    }
  }
}

/// Variables shared by the order templates.
pub fn order_email_data(first_name: Option<&str>, order: &Order) -> Value {
  json!({
    "firstName": first_name.unwrap_or("Customer"),
    "orderNumber": order.order_number,
    "totalAmount": order.total_amount.to_string(),
    "currency": order.currency,
  })
}

/// Looks up the order's owner and sends `template` to them.
pub async fn notify_order_owner(state: &AppState, order: &Order, template: &str, extra: Option<(&str, Value)>) -> bool {
  let user = match state.repos.users.find_by_id(order.user_id).await {
    Ok(Some(user)) => user,
    Ok(None) => {
      warn!(order_id = %order.id, "Order owner not found, skipping email.");
      return false;
    }
    Err(e) => {
      warn!(error = %e, "Could not load order owner, skipping email.");
      return false;
    }
  };
  let mut data = order_email_data(user.first_name.as_deref(), order);
  if let (Some((key, value)), Some(map)) = (extra, data.as_object_mut()) {
    map.insert(key.to_string(), value);
  }
  send_best_effort(state, &user.email, template, data).await
}
