// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use shopflow::{FlowContext, RunOutcome};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtx;
use crate::services::order_service::DraftRequest;
use crate::state::AppState;
use crate::web::extractors::{optional_json_body, AuthenticatedUser};

#[instrument(
  name = "handler::checkout",
  skip(app_state, auth_user, body),
  fields(user_id = %auth_user.user_id)
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request: DraftRequest = optional_json_body(&body)?;
  let ctx = FlowContext::new(CheckoutCtx::new(app_state.get_ref().clone(), auth_user.user_id, request));

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let (order, payment, email_sent) = {
        let guard = ctx.read();
        (guard.order.clone(), guard.payment.clone(), guard.confirmation_sent)
      };
      let (Some(order), Some(payment)) = (order, payment) else {
        return Err(AppError::Internal("Checkout finished without an order or payment".into()));
      };
      info!(order_number = %order.order_number, email_sent, "Checkout complete.");
      Ok(HttpResponse::Ok().json(json!({ "order": order, "payment": payment })))
    }
    RunOutcome::Halted => {
      warn!("Checkout pipeline halted.");
      Err(AppError::PipelineHalted)
    }
  }
}
