// storefront/src/pipelines/checkout_pipeline.rs

//! Checkout: order draft, then payment intent. A draft whose intent could
//! not be created is cancelled before the error is returned.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::CheckoutCtx;
use crate::services::{notification_service, order_service, payment_service};
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const COMPENSATION_NOTE: &str = "Payment intent creation failed";

pub fn register_checkout_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<CheckoutCtx, AppError>::new([
    StepDef::required("load_cart"),
    StepDef::required("resolve_addresses"),
    StepDef::required("create_order_draft"),
    StepDef::required("create_payment_intent"),
    StepDef::optional("send_order_created_email"),
  ]);

  p.on("load_cart", |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let (user_id, cart_id, repos) = {
        let guard = ctx.read();
        (guard.user_id, guard.request.cart_id, guard.app_state.repos.clone())
      };
      let cart = order_service::load_checkout_cart(&repos, user_id, cart_id).await?;
      ctx.write().cart = Some(cart);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("resolve_addresses", |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let (user_id, request, repos) = {
        let guard = ctx.read();
        (guard.user_id, guard.request.clone(), guard.app_state.repos.clone())
      };
      let (shipping, billing) = order_service::resolve_addresses(&repos, user_id, &request).await?;
      let mut guard = ctx.write();
      guard.shipping = Some(shipping);
      guard.billing = Some(billing);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("create_order_draft", |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let (user_id, cart, shipping, billing, repos) = {
        let guard = ctx.read();
        (
          guard.user_id,
          guard.cart.clone(),
          guard.shipping.clone(),
          guard.billing.clone(),
          guard.app_state.repos.clone(),
        )
      };
      let (Some(cart), Some(shipping), Some(billing)) = (cart, shipping, billing) else {
        return Err(AppError::Internal("Checkout context incomplete before create_order_draft".into()));
      };
      let order = order_service::place_draft(&repos, user_id, &cart, shipping, billing).await?;
      ctx.write().order = Some(order);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("create_payment_intent", |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let (order_id, state) = {
        let guard = ctx.read();
        (guard.order.as_ref().map(|o| o.id), guard.app_state.clone())
      };
      let Some(order_id) = order_id else {
        return Err(AppError::Internal("No order before create_payment_intent".into()));
      };

      match payment_service::create_intent(&state, order_id, None, None).await {
        Ok(intent) => {
          info!(%order_id, intent_id = %intent.payment_intent_id, "Checkout payment intent ready.");
          ctx.write().payment = Some(intent);
          Ok(StepControl::Continue)
        }
        Err(intent_err) => {
          warn!(%order_id, error = %intent_err, "Payment intent failed, cancelling draft.");
          match order_service::transition(&state.repos, order_id, OrderStatus::Cancelled, Some(COMPENSATION_NOTE)).await {
            Ok(cancelled) => {
              ctx.write().order = Some(cancelled);
            }
            Err(cancel_err) => {
              error!(%order_id, error = %cancel_err, "Could not cancel draft after payment intent failure.");
            }
          }
          Err::<StepControl, AppError>(intent_err)
        }
      }
    })
  });

  p.on("send_order_created_email", |ctx: FlowContext<CheckoutCtx>| {
    Box::pin(async move {
      let (order, state) = {
        let guard = ctx.read();
        (guard.order.clone(), guard.app_state.clone())
      };
      if let Some(order) = order {
        let sent = notification_service::notify_order_owner(&state, &order, "order_created", None).await;
        ctx.write().confirmation_sent = sent;
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  conductor.register(p);
}
