// storefront/src/services/auth_service.rs

//! Password hashing and the checks applied to credentials before they reach
//! the user repository.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, instrument};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Lower-cases and trims the address, then checks its shape.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
  let email = raw.trim().to_lowercase();
  if !EMAIL_RE.is_match(&email) {
    return Err(AppError::validation("Invalid email address"));
  }
  Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::validation(format!(
      "Password must be at least {} characters",
      MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

/// Argon2id hash with a fresh random salt, in PHC string format.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::validation("Password cannot be empty"));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing failed: {}", e))
    })
}

/// `Ok(false)` on a wrong password. Errors only when the stored hash is unusable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool, AppError> {
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Stored password hash could not be parsed.");
    AppError::Internal(format!("Invalid stored password hash: {}", e))
  })?;

  match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("user123").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "user123").unwrap());
    assert!(!verify_password(&hash, "user124").unwrap());
  }

  #[test]
  fn same_password_gets_different_salts() {
    assert_ne!(hash_password("secret1").unwrap(), hash_password("secret1").unwrap());
  }

  #[test]
  fn garbage_hash_is_an_internal_error() {
    assert!(matches!(verify_password("not-a-hash", "x"), Err(AppError::Internal(_))));
  }

  #[test]
  fn emails_are_normalized() {
    assert_eq!(normalize_email("  Jane@Example.COM ").unwrap(), "jane@example.com");
    assert!(normalize_email("jane@").is_err());
    assert!(normalize_email("no at sign.com").is_err());
  }

  #[test]
  fn short_passwords_are_rejected() {
    assert!(validate_password("12345").is_err());
    assert!(validate_password("123456").is_ok());
  }
}
