// storefront/src/pipelines/payment_webhook_pipeline.rs

use crate::errors::AppError;
use crate::models::{OrderStatus, PaymentStatus};
use crate::pipelines::contexts::PaymentWebhookCtx;
use crate::services::payment_provider::verify_webhook_signature;
use crate::services::{notification_service, order_service, payment_service};
use chrono::Utc;
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn register_payment_webhook_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<PaymentWebhookCtx, AppError>::new([
    StepDef::required("verify_signature")
      .skip_if(|ctx: &PaymentWebhookCtx| ctx.app_state.config.payment.webhook_secret.is_none()),
    StepDef::required("load_intent"),
    StepDef::required("apply_status"),
    StepDef::required("mark_order_paid").skip_if(|ctx: &PaymentWebhookCtx| ctx.status != PaymentStatus::Succeeded),
    StepDef::optional("send_order_paid_email").skip_if(|ctx: &PaymentWebhookCtx| ctx.order_marked_paid.is_none()),
  ]);

  p.on("verify_signature", |ctx: FlowContext<PaymentWebhookCtx>| {
    Box::pin(async move {
      let guard = ctx.read();
      let secret = guard.app_state.config.payment.webhook_secret.clone().unwrap_or_default();
      verify_webhook_signature(
        &secret,
        guard.timestamp.as_deref(),
        guard.signature.as_deref(),
        &guard.raw_body,
        Utc::now().timestamp(),
      )?;
      debug!("Webhook signature verified.");
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("load_intent", |ctx: FlowContext<PaymentWebhookCtx>| {
    Box::pin(async move {
      let (intent_id, repos) = {
        let guard = ctx.read();
        (guard.intent_id.clone(), guard.app_state.repos.clone())
      };
      let intent = payment_service::find_by_provider_id(&repos, &intent_id).await?;
      ctx.write().intent = Some(intent);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("apply_status", |ctx: FlowContext<PaymentWebhookCtx>| {
    Box::pin(async move {
      let (intent, status, payload, repos) = {
        let guard = ctx.read();
        (
          guard.intent.clone(),
          guard.status,
          guard.payload.clone(),
          guard.app_state.repos.clone(),
        )
      };
      let intent = intent.ok_or_else(|| AppError::Internal("No intent before apply_status".into()))?;
      let (stored, changed) = payment_service::apply_status(&repos, &intent, status, payload).await?;
      let mut guard = ctx.write();
      guard.intent = Some(stored);
      guard.status_changed = changed;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  // Only an order still awaiting payment moves. Later states mean an earlier
  // delivery of this webhook already did the work.
  p.on("mark_order_paid", |ctx: FlowContext<PaymentWebhookCtx>| {
    Box::pin(async move {
      let (order_id, repos) = {
        let guard = ctx.read();
        (guard.intent.as_ref().map(|i| i.order_id), guard.app_state.repos.clone())
      };
      let order_id = order_id.ok_or_else(|| AppError::Internal("No intent before mark_order_paid".into()))?;
      let order = repos
        .orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

      match order.status {
        OrderStatus::PendingPayment => {
          let paid = order_service::transition(&repos, order_id, OrderStatus::Paid, None).await?;
          info!(%order_id, order_number = %paid.order_number, "Order marked paid.");
          ctx.write().order_marked_paid = Some(paid);
        }
        OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Completed => {
          debug!(%order_id, status = %order.status, "Order already past payment.");
        }
        OrderStatus::Draft | OrderStatus::Cancelled => {
          warn!(%order_id, status = %order.status, "Payment succeeded for an order that cannot be paid.");
        }
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("send_order_paid_email", |ctx: FlowContext<PaymentWebhookCtx>| {
    Box::pin(async move {
      let (order, state) = {
        let guard = ctx.read();
        (guard.order_marked_paid.clone(), guard.app_state.clone())
      };
      if let Some(order) = order {
        notification_service::notify_order_owner(&state, &order, "order_paid", None).await;
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  conductor.register(p);
}
