// storefront/src/models/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Option<Uuid>,
  pub session_id: Option<String>,
  pub currency: String,
  pub total_amount: Decimal,
  #[sqlx(skip)]
  pub items: Vec<CartItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  /// Sum of the line totals. Stored `total_amount` must always equal this.
  pub fn items_total(&self) -> Decimal {
    self.items.iter().map(|i| i.total_price).sum()
  }

  pub fn owned_by(&self, owner: &CartOwner) -> bool {
    match owner {
      CartOwner::User(id) => self.user_id == Some(*id),
      CartOwner::Session(sid) => self.user_id.is_none() && self.session_id.as_deref() == Some(sid.as_str()),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl CartItem {
  /// Upper bound for one line, merged quantities included.
  pub const MAX_QUANTITY: i32 = 10_000;

  /// Quantity after adding `extra` to a line holding `current`, if still in bounds.
  pub fn merged_quantity(current: i32, extra: i32) -> Option<i32> {
    current.checked_add(extra).filter(|q| *q <= Self::MAX_QUANTITY)
  }
}

/// Who a cart belongs to: a signed-in user, or an anonymous session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
  User(Uuid),
  Session(String),
}

impl CartOwner {
  pub fn user_id(&self) -> Option<Uuid> {
    match self {
      CartOwner::User(id) => Some(*id),
      CartOwner::Session(_) => None,
    }
  }

  pub fn session_id(&self) -> Option<&str> {
    match self {
      CartOwner::User(_) => None,
      CartOwner::Session(sid) => Some(sid),
    }
  }
}
