// storefront/src/services/order_service.rs

//! Order drafts and the guarded status lifecycle.

use crate::errors::{AppError, Result};
use crate::models::{
  AddressInput, AddressSnapshot, Cart, CartOwner, NewOrder, NewOrderItem, Order, OrderStatus,
};
use crate::store::Repositories;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const ORDER_CREATED_NOTE: &str = "Order created";

/// Body of `POST /orders/draft` and `POST /checkout`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
  pub cart_id: Option<Uuid>,
  pub shipping_address_id: Option<Uuid>,
  pub shipping_address: Option<AddressInput>,
  pub billing_address_id: Option<Uuid>,
  pub billing_address: Option<AddressInput>,
}

/// `ORD-{yyyymmdd}-{8 hex}`.
pub fn next_order_number() -> String {
  let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
  format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

pub fn status_change_note(status: OrderStatus) -> String {
  format!("Status changed to {}", status)
}

/// The cart named in the request, or the user's own cart. A named cart must
/// belong to the user or be an anonymous session cart.
#[instrument(name = "order_service::load_cart", skip(repos), err(Display))]
pub async fn load_checkout_cart(repos: &Repositories, user_id: Uuid, cart_id: Option<Uuid>) -> Result<Cart> {
  let cart = match cart_id {
    Some(id) => repos
      .carts
      .find_by_id(id)
      .await?
      .filter(|c| c.user_id.map_or(true, |owner| owner == user_id)),
    None => repos.carts.find_by_owner(&CartOwner::User(user_id)).await?,
  };
  let cart = cart.ok_or_else(|| AppError::not_found("Cart not found"))?;
  if cart.items.is_empty() {
    return Err(AppError::validation("Cart is empty"));
  }
  Ok(cart)
}

fn snapshot_from_input(input: &AddressInput) -> AddressSnapshot {
  AddressSnapshot {
    id: Some(Uuid::new_v4()),
    first_name: input.first_name.clone(),
    last_name: input.last_name.clone(),
    address_line1: input.address_line1.clone(),
    address_line2: input.address_line2.clone(),
    city: input.city.clone(),
    state: input.state.clone(),
    postal_code: input.postal_code.clone(),
    country: if input.country.is_empty() { "TR".into() } else { input.country.clone() },
    phone: input.phone.clone(),
  }
}

async fn resolve_address(
  repos: &Repositories,
  user_id: Uuid,
  address_id: Option<Uuid>,
  inline: Option<&AddressInput>,
) -> Result<Option<AddressSnapshot>> {
  if let Some(id) = address_id {
    let address = repos
      .users
      .find_address(user_id, id)
      .await?
      .ok_or_else(|| AppError::not_found("Address not found"))?;
    return Ok(Some(AddressSnapshot::from(&address)));
  }
  Ok(inline.map(snapshot_from_input))
}

/// Shipping and billing snapshots. Billing falls back to shipping; shipping
/// falls back to a placeholder.
pub async fn resolve_addresses(
  repos: &Repositories,
  user_id: Uuid,
  request: &DraftRequest,
) -> Result<(AddressSnapshot, AddressSnapshot)> {
  let shipping = resolve_address(repos, user_id, request.shipping_address_id, request.shipping_address.as_ref())
    .await?
    .unwrap_or_else(|| AddressSnapshot {
      id: Some(Uuid::new_v4()),
      ..AddressSnapshot::placeholder()
    });
  let billing = resolve_address(repos, user_id, request.billing_address_id, request.billing_address.as_ref())
    .await?
    .unwrap_or_else(|| shipping.clone());
  Ok((shipping, billing))
}

/// Writes the order in `DRAFT` and moves it to `PENDING_PAYMENT`.
#[instrument(name = "order_service::place_draft", skip(repos, cart, shipping, billing), fields(cart_id = %cart.id), err(Display))]
pub async fn place_draft(
  repos: &Repositories,
  user_id: Uuid,
  cart: &Cart,
  shipping: AddressSnapshot,
  billing: AddressSnapshot,
) -> Result<Order> {
  if cart.items.is_empty() {
    return Err(AppError::validation("Cart is empty"));
  }

  let mut items = Vec::with_capacity(cart.items.len());
  for line in &cart.items {
    let product = repos.catalog.find_product(line.product_id).await?;
    items.push(NewOrderItem {
      product_id: line.product_id,
      variant_id: line.variant_id,
      sku: product
        .as_ref()
        .and_then(|p| p.sku.clone())
        .unwrap_or_else(|| format!("SKU-{}", line.product_id)),
      name: product.map(|p| p.name).unwrap_or_else(|| "Product".to_string()),
      quantity: line.quantity,
      unit_price: line.unit_price,
    });
  }

  let draft = repos
    .orders
    .create(NewOrder {
      order_number: next_order_number(),
      user_id,
      status: OrderStatus::Draft,
      currency: cart.currency.clone(),
      shipping_cost: Decimal::ZERO,
      tax_amount: Decimal::ZERO,
      discount_amount: Decimal::ZERO,
      shipping_address: shipping,
      billing_address: billing,
      items,
      note: ORDER_CREATED_NOTE.to_string(),
    })
    .await?;
  info!(order_id = %draft.id, order_number = %draft.order_number, total = %draft.total_amount, "Order draft created.");

  transition(repos, draft.id, OrderStatus::PendingPayment, None).await
}

/// `POST /orders/draft`: cart lookup, address resolution and draft in one call.
pub async fn create_draft(repos: &Repositories, user_id: Uuid, request: &DraftRequest) -> Result<Order> {
  let cart = load_checkout_cart(repos, user_id, request.cart_id).await?;
  let (shipping, billing) = resolve_addresses(repos, user_id, request).await?;
  place_draft(repos, user_id, &cart, shipping, billing).await
}

async fn find_order(repos: &Repositories, order_id: Uuid) -> Result<Order> {
  repos
    .orders
    .find_by_id(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))
}

/// Moves the order to `next`. Staying in the current status is a no-op.
/// Returns the stored order afterwards.
#[instrument(name = "order_service::transition", skip(repos, note), err(Display))]
pub async fn transition(repos: &Repositories, order_id: Uuid, next: OrderStatus, note: Option<&str>) -> Result<Order> {
  let order = find_order(repos, order_id).await?;
  if order.status == next {
    return Ok(order);
  }
  if !order.status.can_transition_to(next) {
    return Err(AppError::validation(format!(
      "Cannot transition order from {} to {}",
      order.status, next
    )));
  }

  let note = note
    .filter(|n| !n.trim().is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| status_change_note(next));
  if !repos.orders.compare_and_set_status(order_id, order.status, next, &note).await? {
    let current = find_order(repos, order_id).await?;
    if current.status == next {
      return Ok(current);
    }
    warn!(expected = %order.status, found = %current.status, "Lost order status race.");
    return Err(AppError::Conflict("Order status changed concurrently".into()));
  }

  info!(from = %order.status, to = %next, "Order status changed.");
  find_order(repos, order_id).await
}

/// Order visible to the viewer. Other users' orders look missing.
pub async fn get_visible(repos: &Repositories, order_id: Uuid, viewer_id: Uuid, is_admin: bool) -> Result<Order> {
  let order = find_order(repos, order_id).await?;
  if !is_admin && order.user_id != viewer_id {
    return Err(AppError::not_found("Order not found"));
  }
  Ok(order)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{NewUser, UserRole};
  use rust_decimal_macros::dec;

  async fn user_with_cart(repos: &Repositories) -> (Uuid, Cart) {
    let user = repos
      .users
      .create(NewUser {
        email: format!("{}@example.com", Uuid::new_v4()),
        password_hash: "x".into(),
        first_name: None,
        last_name: None,
        role: UserRole::User,
      })
      .await
      .unwrap();
    let owner = CartOwner::User(user.id);
    let cart = repos.carts.create(&owner, "TRY").await.unwrap();
    let cart = repos.carts.upsert_item(cart.id, Uuid::new_v4(), None, 2, dec!(10.50)).await.unwrap();
    (user.id, cart)
  }

  #[test]
  fn order_numbers_have_date_and_suffix() {
    let number = next_order_number();
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "ORD");
    assert_eq!(parts[1].len(), 8);
    assert_eq!(parts[2].len(), 8);
    assert_eq!(parts[2], parts[2].to_uppercase());
  }

  #[tokio::test]
  async fn draft_totals_and_defaults() {
    let repos = Repositories::memory();
    let (user_id, _) = user_with_cart(&repos).await;

    let order = create_draft(&repos, user_id, &DraftRequest::default()).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.subtotal, dec!(21.00));
    assert_eq!(order.total_amount, dec!(21.00));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].name, "Product");
    assert_eq!(order.items[0].sku, format!("SKU-{}", order.items[0].product_id));
    assert_eq!(order.shipping_address.0.country, "TR");
    assert!(order.shipping_address.0.id.is_some());
    assert_eq!(order.billing_address.0, order.shipping_address.0);

    let notes: Vec<&str> = order.status_history.iter().map(|h| h.note.as_str()).collect();
    assert_eq!(notes, vec!["Order created", "Status changed to PENDING_PAYMENT"]);
  }

  #[tokio::test]
  async fn someone_elses_cart_is_not_found() {
    let repos = Repositories::memory();
    let (_, cart) = user_with_cart(&repos).await;
    let err = load_checkout_cart(&repos, Uuid::new_v4(), Some(cart.id)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(m) if m == "Cart not found"));
  }

  #[tokio::test]
  async fn illegal_and_repeated_transitions() {
    let repos = Repositories::memory();
    let (user_id, _) = user_with_cart(&repos).await;
    let order = create_draft(&repos, user_id, &DraftRequest::default()).await.unwrap();

    let err = transition(&repos, order.id, OrderStatus::Completed, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(m) if m == "Cannot transition order from PENDING_PAYMENT to COMPLETED"));

    let paid = transition(&repos, order.id, OrderStatus::Paid, None).await.unwrap();
    let again = transition(&repos, order.id, OrderStatus::Paid, None).await.unwrap();
    assert_eq!(again.status, OrderStatus::Paid);
    assert_eq!(again.status_history.len(), paid.status_history.len());
  }
}
