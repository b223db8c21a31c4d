// storefront/src/services/payment_provider.rs

//! Payment provider seam and webhook signature checks.

use crate::config::PaymentConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use rust_decimal::Decimal;
use sha2::Sha256;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Maximum age, in seconds, of a signed webhook.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct ProviderIntent {
  pub id: String,
  pub client_secret: String,
  pub pay_url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
  /// Name stored on every intent this provider creates.
  fn name(&self) -> &str;

  async fn create_intent(&self, order_id: Uuid, amount: Decimal, currency: &str) -> Result<ProviderIntent>;
}

/// Issues provider-shaped ids locally. No network calls.
#[derive(Debug, Clone)]
pub struct MockPaymentProvider {
  name: String,
  pay_url_base: Option<String>,
}

impl MockPaymentProvider {
  pub fn new(config: &PaymentConfig) -> Self {
    Self {
      name: config.provider.clone(),
      pay_url_base: config.pay_url_base.clone(),
    }
  }
}

fn random_hex(bytes: usize) -> String {
  let mut buf = vec![0u8; bytes];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
  fn name(&self) -> &str {
    &self.name
  }

  #[instrument(name = "payment_provider::create_intent", skip(self), fields(provider = %self.name))]
  async fn create_intent(&self, order_id: Uuid, amount: Decimal, currency: &str) -> Result<ProviderIntent> {
    if amount <= Decimal::ZERO {
      return Err(AppError::validation("Amount must be greater than zero"));
    }
    let id = format!("pi_{}_{}", Utc::now().timestamp_millis(), random_hex(6));
    let pay_url = self.pay_url_base.as_ref().map(|base| format!("{}/{}", base, id));
    info!(intent_id = %id, "Payment intent issued.");
    Ok(ProviderIntent {
      client_secret: format!("pi_secret_{}", random_hex(16)),
      id,
      pay_url,
    })
  }
}

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `{timestamp}.{body}`.
pub fn sign_webhook(secret: &str, timestamp: i64, body: &[u8]) -> Result<String> {
  Ok(hex::encode(webhook_mac(secret, timestamp, body)?.finalize().into_bytes()))
}

fn webhook_mac(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(body);
  Ok(mac)
}

/// Checks the signature and the timestamp window against `now` (unix seconds).
pub fn verify_webhook_signature(
  secret: &str,
  timestamp: Option<&str>,
  signature: Option<&str>,
  body: &[u8],
  now: i64,
) -> Result<()> {
  let invalid = || AppError::unauthorized("Invalid webhook signature");

  let timestamp: i64 = timestamp.and_then(|t| t.trim().parse().ok()).ok_or_else(invalid)?;
  if now.abs_diff(timestamp) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
    warn!(timestamp, now, "Webhook timestamp outside tolerance.");
    return Err(invalid());
  }
  let signature = signature.and_then(|s| hex::decode(s.trim()).ok()).ok_or_else(invalid)?;
  webhook_mac(secret, timestamp, body)?.verify_slice(&signature).map_err(|_| {
    warn!("Webhook signature mismatch.");
    invalid()
  })
}
