// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use shopflow::{FlowContext, RunOutcome};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CartOwner;
use crate::pipelines::contexts::AddToCartCtx;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::{session_header, MaybeUser};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
  pub session_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
  pub session_id: Option<String>,
}

fn default_quantity() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
  pub quantity: i32,
  pub session_id: Option<String>,
}

/// Signed-in users own their cart; anonymous callers are keyed by session id
/// from the header, then the query string, then the body.
fn cart_owner(
  user: &MaybeUser,
  req: &HttpRequest,
  query: &SessionQuery,
  body_session: Option<&str>,
) -> Result<CartOwner, AppError> {
  if let Some(user) = &user.0 {
    return Ok(CartOwner::User(user.user_id));
  }
  session_header(req)
    .or_else(|| query.session_id.clone())
    .or_else(|| body_session.map(str::to_string))
    .filter(|s| !s.trim().is_empty())
    .map(CartOwner::Session)
    .ok_or_else(|| AppError::validation("A user token or session id is required"))
}

#[instrument(name = "handler::get_cart", skip_all)]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  query: web::Query<SessionQuery>,
) -> Result<HttpResponse, AppError> {
  let owner = cart_owner(&user, &req, &query, None)?;
  let cart = cart_service::get_or_create(&app_state.repos, &owner, &app_state.config.default_currency).await?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req, user, query, payload),
  fields(product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  query: web::Query<SessionQuery>,
  payload: web::Json<AddItemPayload>,
) -> Result<HttpResponse, AppError> {
  let owner = cart_owner(&user, &req, &query, payload.session_id.as_deref())?;
  let ctx = FlowContext::new(AddToCartCtx {
    app_state: app_state.get_ref().clone(),
    owner,
    product_id: payload.product_id,
    variant_id: payload.variant_id,
    quantity: payload.quantity,
    product: None,
    cart_id: None,
    cart: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let cart = ctx
        .read()
        .cart
        .clone()
        .ok_or_else(|| AppError::Internal("Add to cart finished without a cart".into()))?;
      Ok(HttpResponse::Ok().json(cart))
    }
    RunOutcome::Halted => {
      warn!("Add to cart pipeline halted.");
      Err(AppError::PipelineHalted)
    }
  }
}

#[instrument(name = "handler::update_cart_item", skip(app_state, req, user, query, payload))]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  query: web::Query<SessionQuery>,
  item_id: web::Path<Uuid>,
  payload: web::Json<UpdateItemPayload>,
) -> Result<HttpResponse, AppError> {
  let owner = cart_owner(&user, &req, &query, payload.session_id.as_deref())?;
  let cart = cart_service::update_item_quantity(&app_state.repos, &owner, *item_id, payload.quantity).await?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, req, user, query))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
  query: web::Query<SessionQuery>,
  item_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let owner = cart_owner(&user, &req, &query, None)?;
  let cart = cart_service::remove_item(&app_state.repos, &owner, *item_id).await?;
  Ok(HttpResponse::Ok().json(cart))
}
