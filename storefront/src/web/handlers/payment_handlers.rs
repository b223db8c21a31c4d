// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use shopflow::{FlowContext, RunOutcome};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::PaymentStatus;
use crate::pipelines::contexts::PaymentWebhookCtx;
use crate::services::{order_service, payment_service};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentPayload {
  pub order_id: Uuid,
  pub amount: Option<Decimal>,
  pub currency: Option<String>,
}

#[instrument(
  name = "handler::create_payment_intent",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.user_id, order_id = %payload.order_id)
)]
pub async fn create_intent_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CreateIntentPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  // Hides other users' orders behind a 404.
  order_service::get_visible(&app_state.repos, payload.order_id, auth_user.user_id, auth_user.is_admin()).await?;
  let intent = payment_service::create_intent(&app_state, payload.order_id, payload.amount, payload.currency).await?;
  Ok(HttpResponse::Ok().json(intent))
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
  req.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Provider callback. The raw body is kept for signature checks.
#[instrument(name = "handler::payment_webhook", skip_all, fields(body_len = body.len()))]
pub async fn webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let payload: Value =
    serde_json::from_slice(&body).map_err(|e| AppError::validation(format!("Invalid webhook payload: {}", e)))?;
  let intent_id = payload
    .get("intentId")
    .and_then(Value::as_str)
    .filter(|s| !s.is_empty())
    .map(str::to_string);
  let raw_status = payload.get("status").and_then(Value::as_str);
  let (Some(intent_id), Some(raw_status)) = (intent_id, raw_status) else {
    return Err(AppError::validation("intentId and status are required"));
  };
  let status: PaymentStatus = raw_status
    .parse()
    .map_err(|_| AppError::validation("Invalid payment status"))?;

  let ctx = FlowContext::new(PaymentWebhookCtx {
    app_state: app_state.get_ref().clone(),
    timestamp: header_value(&req, TIMESTAMP_HEADER),
    signature: header_value(&req, SIGNATURE_HEADER),
    raw_body: body,
    payload,
    intent_id,
    status,
    intent: None,
    status_changed: false,
    order_marked_paid: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let (changed, paid) = {
        let guard = ctx.read();
        (guard.status_changed, guard.order_marked_paid.is_some())
      };
      info!(%status, changed, order_marked_paid = paid, "Webhook processed.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    RunOutcome::Halted => {
      warn!("Webhook pipeline halted.");
      Err(AppError::PipelineHalted)
    }
  }
}
