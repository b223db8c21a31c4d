// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopflow::{FlowContext, RunOutcome};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::AddressInput;
use crate::pipelines::contexts::{LoginCtx, RegisterCtx};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
  #[serde(default)]
  pub refresh_token: String,
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = FlowContext::new(RegisterCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    first_name: payload.first_name,
    last_name: payload.last_name,
    password_hash: None,
    user: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let user = ctx
        .read()
        .user
        .clone()
        .ok_or_else(|| AppError::Internal("Registration finished without a user".into()))?;
      info!(user_id = %user.id, "Registration complete.");
      Ok(HttpResponse::Created().json(json!({
        "id": user.id,
        "email": user.email,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "createdAt": user.created_at,
      })))
    }
    RunOutcome::Halted => {
      warn!("Registration pipeline halted.");
      Err(AppError::PipelineHalted)
    }
  }
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = FlowContext::new(LoginCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    user: None,
    tokens: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let (user, tokens) = {
        let guard = ctx.read();
        (guard.user.clone(), guard.tokens.clone())
      };
      let (Some(user), Some(tokens)) = (user, tokens) else {
        return Err(AppError::Internal("Login finished without tokens".into()));
      };
      Ok(HttpResponse::Ok().json(json!({
        "accessToken": tokens.access_token,
        "refreshToken": tokens.refresh_token,
        "user": { "id": user.id, "email": user.email, "role": user.role },
      })))
    }
    RunOutcome::Halted => Err(AppError::PipelineHalted),
  }
}

#[instrument(name = "handler::refresh", skip_all)]
pub async fn refresh_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RefreshPayload>,
) -> Result<HttpResponse, AppError> {
  let claims = app_state.tokens.verify_refresh(&payload.refresh_token)?;
  let user = app_state
    .repos
    .users
    .find_by_id(claims.sub)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;
  let pair = app_state.tokens.issue_pair(&user)?;
  Ok(HttpResponse::Ok().json(pair))
}

#[instrument(name = "handler::me", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = app_state
    .repos
    .users
    .find_by_id(auth_user.user_id)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;
  Ok(HttpResponse::Ok().json(user))
}

pub async fn list_addresses_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let addresses = app_state.repos.users.list_addresses(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(addresses))
}

#[instrument(name = "handler::create_address", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<AddressInput>,
) -> Result<HttpResponse, AppError> {
  let input = payload.into_inner();
  if input.first_name.trim().is_empty()
    || input.last_name.trim().is_empty()
    || input.address_line1.trim().is_empty()
    || input.city.trim().is_empty()
    || input.postal_code.trim().is_empty()
    || input.country.trim().is_empty()
  {
    return Err(AppError::validation(
      "firstName, lastName, addressLine1, city, postalCode and country are required",
    ));
  }
  let address = app_state.repos.users.create_address(auth_user.user_id, input).await?;
  Ok(HttpResponse::Created().json(address))
}
