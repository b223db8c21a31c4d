// storefront/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::notification_service::{self, SendEmailRequest};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[instrument(name = "handler::send_email", skip(app_state, _admin, payload), fields(template = %payload.template))]
pub async fn send_email_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<SendEmailRequest>,
) -> Result<HttpResponse, AppError> {
  let log = notification_service::send(&app_state, payload.into_inner()).await?;
  info!(log_id = %log.id, "Email sent.");
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
