// storefront/src/services/payment_service.rs

use crate::errors::{AppError, Result};
use crate::models::{NewPaymentIntent, OrderStatus, PaymentIntent, PaymentStatus};
use crate::state::AppState;
use crate::store::Repositories;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
  pub payment_intent_id: String,
  pub client_secret: String,
  pub pay_url: Option<String>,
}

/// Creates a provider intent for an order awaiting payment. Amount and
/// currency default to the order's.
#[instrument(name = "payment_service::create_intent", skip(state), err(Display))]
pub async fn create_intent(
  state: &AppState,
  order_id: Uuid,
  amount: Option<Decimal>,
  currency: Option<String>,
) -> Result<IntentResponse> {
  let order = state
    .repos
    .orders
    .find_by_id(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;
  if order.status != OrderStatus::PendingPayment {
    return Err(AppError::validation(format!(
      "Order is not awaiting payment (status {})",
      order.status
    )));
  }

  let amount = amount.unwrap_or(order.total_amount);
  let currency = currency
    .filter(|c| !c.trim().is_empty())
    .map(|c| c.to_ascii_uppercase())
    .unwrap_or_else(|| order.currency.clone());

  let issued = state.payments.create_intent(order.id, amount, &currency).await?;
  let intent = state
    .repos
    .payments
    .create_intent(NewPaymentIntent {
      order_id: order.id,
      provider: state.payments.name().to_string(),
      provider_intent_id: issued.id.clone(),
      amount,
      currency: currency.clone(),
      client_secret: Some(issued.client_secret.clone()),
    })
    .await?;
  state
    .repos
    .payments
    .append_log(
      intent.id,
      "created",
      json!({ "orderId": order.id, "amount": amount, "currency": currency }),
    )
    .await?;
  info!(intent_id = %issued.id, order_number = %order.order_number, "Payment intent created.");

  Ok(IntentResponse {
    payment_intent_id: issued.id,
    client_secret: issued.client_secret,
    pay_url: issued.pay_url,
  })
}

pub async fn find_by_provider_id(repos: &Repositories, provider_intent_id: &str) -> Result<PaymentIntent> {
  repos
    .payments
    .find_by_provider_intent_id(provider_intent_id)
    .await?
    .ok_or_else(|| AppError::not_found("Payment intent not found"))
}

/// Logs the event, then moves the intent to `next`. Returns the stored intent
/// and whether its status changed.
#[instrument(name = "payment_service::apply_status", skip(repos, intent, payload), fields(intent_id = %intent.provider_intent_id), err(Display))]
pub async fn apply_status(
  repos: &Repositories,
  intent: &PaymentIntent,
  next: PaymentStatus,
  payload: Value,
) -> Result<(PaymentIntent, bool)> {
  repos
    .payments
    .append_log(intent.id, &next.as_str().to_lowercase(), payload)
    .await?;

  if intent.status == next {
    info!(status = %next, "Payment status already applied.");
    return Ok((intent.clone(), false));
  }
  if !intent.status.can_transition_to(next) {
    return Err(AppError::validation(format!(
      "Cannot transition payment from {} to {}",
      intent.status, next
    )));
  }

  let changed = repos.payments.compare_and_set_status(intent.id, intent.status, next).await?;
  let stored = repos
    .payments
    .find_by_id(intent.id)
    .await?
    .ok_or_else(|| AppError::not_found("Payment intent not found"))?;
  if !changed {
    if stored.status == next {
      return Ok((stored, false));
    }
    warn!(expected = %intent.status, found = %stored.status, "Lost payment status race.");
    return Err(AppError::Conflict("Payment status changed concurrently".into()));
  }
  info!(from = %intent.status, to = %next, "Payment status changed.");
  Ok((stored, true))
}
