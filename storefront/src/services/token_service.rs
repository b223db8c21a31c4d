// storefront/src/services/token_service.rs

//! HS256 access and refresh tokens.

use crate::config::JwtConfig;
use crate::errors::AppError;
use crate::models::{User, UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub sub: Uuid,
  pub user_id: Uuid,
  pub email: String,
  pub role: UserRole,
  pub iat: i64,
  pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
  pub access_token: String,
  pub refresh_token: String,
}

struct KeyPair {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl KeyPair {
  fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }
}

pub struct TokenService {
  access: KeyPair,
  refresh: KeyPair,
  validation: Validation,
}

impl TokenService {
  pub fn new(config: &JwtConfig) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Self {
      access: KeyPair::new(&config.secret, config.expires_in),
      refresh: KeyPair::new(&config.refresh_secret, config.refresh_expires_in),
      validation,
    }
  }

  pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
      access_token: self.sign(&self.access, user.id, &user.email, user.role)?,
      refresh_token: self.sign(&self.refresh, user.id, &user.email, user.role)?,
    })
  }

  pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
    self.verify(&self.access, token).map_err(|_| AppError::unauthorized("Invalid token"))
  }

  pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
    self
      .verify(&self.refresh, token)
      .map_err(|_| AppError::unauthorized("Invalid refresh token"))
  }

  fn sign(&self, keys: &KeyPair, user_id: Uuid, email: &str, role: UserRole) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
      sub: user_id,
      user_id,
      email: email.to_string(),
      role,
      iat: now.timestamp(),
      exp: (now + keys.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
      .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
  }

  fn verify(&self, keys: &KeyPair, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    decode::<Claims>(token, &keys.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        debug!(error = %e, "Token rejected.");
        e
      })
  }
}
