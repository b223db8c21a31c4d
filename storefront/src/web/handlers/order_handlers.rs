// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::services::order_service::{self, DraftRequest};
use crate::services::notification_service;
use crate::state::AppState;
use crate::web::extractors::{optional_json_body, AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: Option<String>,
  pub note: Option<String>,
}

#[instrument(name = "handler::create_order_draft", skip(app_state, auth_user, body), fields(user_id = %auth_user.user_id))]
pub async fn create_draft_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request: DraftRequest = optional_json_body(&body)?;
  let order = order_service::create_draft(&app_state.repos, auth_user.user_id, &request).await?;
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let scope = if auth_user.is_admin() { None } else { Some(auth_user.user_id) };
  let orders = app_state.repos.orders.list(scope).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  order_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::get_visible(&app_state.repos, *order_id, auth_user.user_id, auth_user.is_admin()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::mark_order_paid", skip(app_state, _admin))]
pub async fn mark_paid_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  order_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::transition(&app_state.repos, *order_id, OrderStatus::Paid, None).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order_status", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id))]
pub async fn update_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  order_id: web::Path<Uuid>,
  payload: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let raw_status = payload
    .status
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| AppError::validation("Status is required"))?;
  let next: OrderStatus = raw_status.parse().map_err(|_| AppError::validation("Invalid status"))?;

  let before = order_service::get_visible(&app_state.repos, *order_id, admin.0.user_id, true).await?;
  let order = order_service::transition(&app_state.repos, *order_id, next, payload.note.as_deref()).await?;
  info!(order_id = %order.id, from = %before.status, to = %order.status, "Order status updated by admin.");

  if next == OrderStatus::Shipped && before.status != OrderStatus::Shipped {
    let tracking = Value::String(payload.note.unwrap_or_default());
    notification_service::notify_order_owner(&app_state, &order, "order_shipped", Some(("trackingNumber", tracking)))
      .await;
  }
  Ok(HttpResponse::Ok().json(order))
}
