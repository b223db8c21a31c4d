// storefront/src/web/extractors.rs

//! Request extractors for bearer-token identity.

use crate::errors::AppError;
use crate::models::UserRole;
use crate::state::AppState;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-id";

/// Identity taken from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub email: String,
  pub role: UserRole,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == UserRole::Admin
  }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<Option<AuthenticatedUser>, AppError> {
  let Some(token) = bearer_token(req) else {
    return Ok(None);
  };
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("AppState is not configured".into()))?;
  let claims = state.tokens.verify_access(token)?;
  debug!(user_id = %claims.sub, "Bearer token accepted.");
  Ok(Some(AuthenticatedUser {
    user_id: claims.sub,
    email: claims.email,
    role: claims.role,
  }))
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req).and_then(|user| user.ok_or_else(|| AppError::unauthorized("Unauthorized"))))
  }
}

/// An authenticated user with the `ADMIN` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = authenticate(req).and_then(|user| match user {
      None => Err(AppError::unauthorized("Unauthorized")),
      Some(user) if user.is_admin() => Ok(AdminUser(user)),
      Some(_) => Err(AppError::Forbidden("Forbidden: Admin access required".into())),
    });
    ready(result)
  }
}

/// Bearer identity when a token is sent. A token that is sent but invalid is
/// still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req).map(MaybeUser))
  }
}

/// Value of the `x-session-id` header, if any.
pub fn session_header(req: &HttpRequest) -> Option<String> {
  req
    .headers()
    .get(SESSION_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

/// Parses a JSON body that may be left out entirely. An empty body gives
/// `T::default()`; anything else must deserialize.
pub fn optional_json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(T::default());
  }
  serde_json::from_slice(body).map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::order_service::DraftRequest;

  #[test]
  fn empty_body_falls_back_to_defaults() {
    let parsed: DraftRequest = optional_json_body(b"").unwrap();
    assert!(parsed.cart_id.is_none());
    let parsed: DraftRequest = optional_json_body(b"  \n").unwrap();
    assert!(parsed.shipping_address.is_none());
  }

  #[test]
  fn malformed_or_mistyped_bodies_are_rejected() {
    for body in ["{garbage", r#"{"cartId":"not-a-uuid"}"#, r#"{"shippingAddressId":42}"#, "null"] {
      let err = optional_json_body::<DraftRequest>(body.as_bytes()).unwrap_err();
      assert!(matches!(err, AppError::Validation(m) if m.starts_with("Invalid request body: ")));
    }
  }
}
