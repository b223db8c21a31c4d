// storefront/src/services/cart_service.rs

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CartOwner, Product};
use crate::store::{quantity_limit_exceeded, Repositories};
use tracing::{debug, instrument};
use uuid::Uuid;

pub fn validate_quantity(quantity: i32) -> Result<()> {
  if quantity < 1 {
    return Err(AppError::validation("Quantity must be at least 1"));
  }
  if quantity > CartItem::MAX_QUANTITY {
    return Err(quantity_limit_exceeded());
  }
  Ok(())
}

/// The owner's cart, created on first access.
#[instrument(name = "cart_service::get_or_create", skip(repos, currency), err(Display))]
pub async fn get_or_create(repos: &Repositories, owner: &CartOwner, currency: &str) -> Result<Cart> {
  if let Some(cart) = repos.carts.find_by_owner(owner).await? {
    return Ok(cart);
  }
  debug!("No cart yet, creating one.");
  repos.carts.create(owner, currency).await
}

/// Active product a cart line can point at.
pub async fn purchasable_product(repos: &Repositories, product_id: Uuid) -> Result<Product> {
  repos
    .catalog
    .find_product(product_id)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(|| AppError::not_found("Product not found"))
}

async fn owned_cart(repos: &Repositories, owner: &CartOwner) -> Result<Cart> {
  repos
    .carts
    .find_by_owner(owner)
    .await?
    .ok_or_else(|| AppError::not_found("Cart not found"))
}

#[instrument(name = "cart_service::update_item", skip(repos), err(Display))]
pub async fn update_item_quantity(repos: &Repositories, owner: &CartOwner, item_id: Uuid, quantity: i32) -> Result<Cart> {
  validate_quantity(quantity)?;
  let cart = owned_cart(repos, owner).await?;
  repos
    .carts
    .set_item_quantity(cart.id, item_id, quantity)
    .await?
    .ok_or_else(|| AppError::not_found("Cart item not found"))
}

#[instrument(name = "cart_service::remove_item", skip(repos), err(Display))]
pub async fn remove_item(repos: &Repositories, owner: &CartOwner, item_id: Uuid) -> Result<Cart> {
  let cart = owned_cart(repos, owner).await?;
  repos
    .carts
    .remove_item(cart.id, item_id)
    .await?
    .ok_or_else(|| AppError::not_found("Cart item not found"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[tokio::test]
  async fn items_of_another_cart_are_not_found() {
    let repos = Repositories::memory();
    let alice = CartOwner::Session("alice".into());
    let bob = CartOwner::Session("bob".into());
    let product = Uuid::new_v4();

    let alice_cart = get_or_create(&repos, &alice, "TRY").await.unwrap();
    let alice_cart = repos.carts.upsert_item(alice_cart.id, product, None, 1, dec!(5)).await.unwrap();
    get_or_create(&repos, &bob, "TRY").await.unwrap();

    let item_id = alice_cart.items[0].id;
    let err = update_item_quantity(&repos, &bob, item_id, 3).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(m) if m == "Cart item not found"));

    let updated = update_item_quantity(&repos, &alice, item_id, 3).await.unwrap();
    assert_eq!(updated.total_amount, dec!(15));
  }

  #[tokio::test]
  async fn zero_quantity_is_rejected_before_lookup() {
    let repos = Repositories::memory();
    let owner = CartOwner::User(Uuid::new_v4());
    let err = update_item_quantity(&repos, &owner, Uuid::new_v4(), 0).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(m) if m == "Quantity must be at least 1"));
  }

  #[test]
  fn quantities_are_bounded() {
    assert!(validate_quantity(CartItem::MAX_QUANTITY).is_ok());
    let err = validate_quantity(i32::MAX).unwrap_err();
    assert!(matches!(err, AppError::Validation(m) if m == "Quantity must be at most 10000"));

    assert_eq!(CartItem::merged_quantity(2, 3), Some(5));
    assert_eq!(CartItem::merged_quantity(CartItem::MAX_QUANTITY, 1), None);
    assert_eq!(CartItem::merged_quantity(i32::MAX, i32::MAX), None);
  }

  #[tokio::test]
  async fn missing_cart_is_not_found() {
    let repos = Repositories::memory();
    let owner = CartOwner::User(Uuid::new_v4());
    let err = remove_item(&repos, &owner, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(m) if m == "Cart not found"));
  }
}
