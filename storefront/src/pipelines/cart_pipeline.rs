// storefront/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtx;
use crate::services::cart_service;
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{debug, info};

pub fn register_add_to_cart_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<AddToCartCtx, AppError>::new([
    StepDef::required("validate_quantity"),
    StepDef::required("load_product"),
    StepDef::required("resolve_cart"),
    StepDef::required("upsert_line"),
  ]);

  p.on("validate_quantity", |ctx: FlowContext<AddToCartCtx>| {
    Box::pin(async move {
      let quantity = ctx.read().quantity;
      cart_service::validate_quantity(quantity)?;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  // The line price always comes from the catalog, never from the client.
  p.on("load_product", |ctx: FlowContext<AddToCartCtx>| {
    Box::pin(async move {
      let (product_id, repos) = {
        let guard = ctx.read();
        (guard.product_id, guard.app_state.repos.clone())
      };
      let product = cart_service::purchasable_product(&repos, product_id).await?;
      debug!(%product_id, price = %product.price, "Product priced for cart.");
      ctx.write().product = Some(product);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("resolve_cart", |ctx: FlowContext<AddToCartCtx>| {
    Box::pin(async move {
      let (owner, state) = {
        let guard = ctx.read();
        (guard.owner.clone(), guard.app_state.clone())
      };
      let cart = cart_service::get_or_create(&state.repos, &owner, &state.config.default_currency).await?;
      ctx.write().cart_id = Some(cart.id);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("upsert_line", |ctx: FlowContext<AddToCartCtx>| {
    Box::pin(async move {
      let (cart_id, product, variant_id, quantity, repos) = {
        let guard = ctx.read();
        (
          guard.cart_id,
          guard.product.clone(),
          guard.variant_id,
          guard.quantity,
          guard.app_state.repos.clone(),
        )
      };
      let (Some(cart_id), Some(product)) = (cart_id, product) else {
        return Err(AppError::Internal("Cart or product missing before upsert_line".into()));
      };
      let cart = repos
        .carts
        .upsert_item(cart_id, product.id, variant_id, quantity, product.price)
        .await?;
      info!(%cart_id, product_id = %product.id, quantity, total = %cart.total_amount, "Cart line added.");
      ctx.write().cart = Some(cart);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  conductor.register(p);
}
