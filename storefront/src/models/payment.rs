// storefront/src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
  Pending,
  Succeeded,
  Failed,
  Cancelled,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Succeeded => "SUCCEEDED",
      PaymentStatus::Failed => "FAILED",
      PaymentStatus::Cancelled => "CANCELLED",
    }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, PaymentStatus::Pending)
  }

  pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
    matches!(self, PaymentStatus::Pending) && next.is_terminal()
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(PaymentStatus::Pending),
      "SUCCEEDED" => Ok(PaymentStatus::Succeeded),
      "FAILED" => Ok(PaymentStatus::Failed),
      "CANCELLED" | "CANCELED" => Ok(PaymentStatus::Cancelled),
      other => Err(format!("Unknown payment status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
  pub id: Uuid,
  pub order_id: Uuid,
  pub provider: String,
  pub provider_intent_id: String,
  pub amount: Decimal,
  pub currency: String,
  pub status: PaymentStatus,
  #[serde(skip_serializing)]
  pub client_secret: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
  pub order_id: Uuid,
  pub provider: String,
  pub provider_intent_id: String,
  pub amount: Decimal,
  pub currency: String,
  pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLog {
  pub id: Uuid,
  pub payment_intent_id: Uuid,
  pub event: String,
  pub payload: serde_json::Value,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_pending_moves() {
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Succeeded));
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
    assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Cancelled));
    assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
    assert!(!PaymentStatus::Succeeded.can_transition_to(PaymentStatus::Failed));
    assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Succeeded));
  }

  #[test]
  fn parses_provider_spellings() {
    assert_eq!("succeeded".parse::<PaymentStatus>().unwrap(), PaymentStatus::Succeeded);
    assert_eq!("canceled".parse::<PaymentStatus>().unwrap(), PaymentStatus::Cancelled);
    assert!("refunded".parse::<PaymentStatus>().is_err());
  }
}
