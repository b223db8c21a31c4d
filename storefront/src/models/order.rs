// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Draft,
  PendingPayment,
  Paid,
  Shipped,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::Draft,
    OrderStatus::PendingPayment,
    OrderStatus::Paid,
    OrderStatus::Shipped,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Draft => "DRAFT",
      OrderStatus::PendingPayment => "PENDING_PAYMENT",
      OrderStatus::Paid => "PAID",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Completed => "COMPLETED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  /// Forward edges of the order lifecycle. Staying in place is not an edge.
  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Draft, PendingPayment)
        | (Draft, Cancelled)
        | (PendingPayment, Paid)
        | (PendingPayment, Cancelled)
        | (Paid, Shipped)
        | (Paid, Cancelled)
        | (Shipped, Completed)
    )
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("Unknown order status '{}'", s))
  }
}

/// Copy of an address taken when the order is placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
  pub id: Option<Uuid>,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: String,
  #[serde(default)]
  pub address_line1: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address_line2: Option<String>,
  #[serde(default)]
  pub city: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<String>,
  #[serde(default)]
  pub postal_code: String,
  #[serde(default)]
  pub country: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

impl AddressSnapshot {
  pub fn placeholder() -> Self {
    Self {
      country: "TR".into(),
      ..Default::default()
    }
  }
}

impl From<&Address> for AddressSnapshot {
  fn from(a: &Address) -> Self {
    Self {
      id: Some(a.id),
      first_name: a.first_name.clone(),
      last_name: a.last_name.clone(),
      address_line1: a.address_line1.clone(),
      address_line2: a.address_line2.clone(),
      city: a.city.clone(),
      state: a.state.clone(),
      postal_code: a.postal_code.clone(),
      country: a.country.clone(),
      phone: a.phone.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub subtotal: Decimal,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub discount_amount: Decimal,
  pub total_amount: Decimal,
  pub currency: String,
  pub shipping_address: Json<AddressSnapshot>,
  pub billing_address: Json<AddressSnapshot>,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
  #[sqlx(skip)]
  pub status_history: Vec<OrderStatusHistory>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub sku: String,
  pub name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusHistory {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub note: String,
  pub created_at: DateTime<Utc>,
}

/// Line of a draft order before it has ids.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub variant_id: Option<Uuid>,
  pub sku: String,
  pub name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
}

impl NewOrderItem {
  pub fn total_price(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order_number: String,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub currency: String,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub discount_amount: Decimal,
  pub shipping_address: AddressSnapshot,
  pub billing_address: AddressSnapshot,
  pub items: Vec<NewOrderItem>,
  pub note: String,
}

impl NewOrder {
  pub fn subtotal(&self) -> Decimal {
    self.items.iter().map(NewOrderItem::total_price).sum()
  }

  pub fn total_amount(&self) -> Decimal {
    self.subtotal() + self.shipping_cost + self.tax_amount - self.discount_amount
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use OrderStatus::*;

  #[test]
  fn lifecycle_edges_are_exactly_the_allowed_ones() {
    let allowed = [
      (Draft, PendingPayment),
      (Draft, Cancelled),
      (PendingPayment, Paid),
      (PendingPayment, Cancelled),
      (Paid, Shipped),
      (Paid, Cancelled),
      (Shipped, Completed),
    ];
    for from in OrderStatus::ALL {
      for to in OrderStatus::ALL {
        assert_eq!(
          from.can_transition_to(to),
          allowed.contains(&(from, to)),
          "{from} -> {to}"
        );
      }
    }
  }

  #[test]
  fn terminal_states_have_no_exits() {
    for to in OrderStatus::ALL {
      assert!(!Completed.can_transition_to(to));
      assert!(!Cancelled.can_transition_to(to));
    }
  }

  #[test]
  fn status_parses_case_insensitively() {
    assert_eq!("pending_payment".parse::<OrderStatus>().unwrap(), PendingPayment);
    assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), Shipped);
    assert!("LOST".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn status_serializes_screaming_snake_case() {
    assert_eq!(serde_json::to_string(&PendingPayment).unwrap(), "\"PENDING_PAYMENT\"");
  }
}
