// storefront/src/store/seed.rs

//! Development fixtures. Safe to run on every boot: existing rows are kept.

use super::Repositories;
use crate::errors::{AppError, Result};
use crate::models::{AddressInput, Category, CategoryInput, NewTemplate, NewUser, ProductInput, User, UserRole};
use crate::services::auth_service::hash_password;
use rust_decimal_macros::dec;
use tracing::{info, instrument};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@ecommerce.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_EMAIL: &str = "user@ecommerce.com";
pub const USER_PASSWORD: &str = "user123";

#[instrument(name = "seed::run", skip_all, err(Display))]
pub async fn seed(repos: &Repositories, currency: &str) -> Result<()> {
  seed_user(repos, ADMIN_EMAIL, ADMIN_PASSWORD, "Admin", UserRole::Admin).await?;
  let customer = seed_user(repos, USER_EMAIL, USER_PASSWORD, "Test", UserRole::User).await?;

  if repos.users.list_addresses(customer.id).await?.is_empty() {
    repos
      .users
      .create_address(
        customer.id,
        AddressInput {
          first_name: "Test".into(),
          last_name: "User".into(),
          address_line1: "Test Street No:1".into(),
          city: "Istanbul".into(),
          state: Some("Istanbul".into()),
          postal_code: "34000".into(),
          country: "TR".into(),
          phone: Some("+905551234567".into()),
          is_default: true,
          ..Default::default()
        },
      )
      .await?;
  }

  let apple = repos.catalog.create_brand("Apple", "apple").await?;
  let samsung = repos.catalog.create_brand("Samsung", "samsung").await?;

  let electronics = seed_category(repos, "Electronics", "electronics", None).await?;
  let smartphones = seed_category(repos, "Smartphones", "smartphones", Some(electronics.id)).await?;

  let products = [
    ProductInput {
      name: "iPhone 15 Pro".into(),
      slug: "iphone-15-pro".into(),
      description: Some("Apple iPhone 15 Pro, 128GB".into()),
      price: dec!(49999.99),
      currency: Some(currency.to_string()),
      sku: Some("IPH15PRO001".into()),
      image: Some("/images/iphone-15-pro.jpg".into()),
      images: vec!["/images/iphone-15-pro.jpg".into()],
      category_id: Some(smartphones.id),
      brand_id: Some(apple.id),
    },
    ProductInput {
      name: "Samsung Galaxy S24".into(),
      slug: "samsung-galaxy-s24".into(),
      description: Some("Samsung Galaxy S24, 256GB".into()),
      price: dec!(39999.99),
      currency: Some(currency.to_string()),
      sku: Some("SGS24001".into()),
      image: Some("/images/galaxy-s24.jpg".into()),
      images: vec!["/images/galaxy-s24.jpg".into()],
      category_id: Some(smartphones.id),
      brand_id: Some(samsung.id),
    },
  ];
  for product in products {
    if repos.catalog.find_product_by_slug(&product.slug).await?.is_some() {
      continue;
    }
    match repos.catalog.create_product(product, currency).await {
      Ok(_) | Err(AppError::Validation(_)) => {}
      Err(e) => return Err(e),
    }
  }

  for template in templates() {
    repos.notifications.ensure_template(template).await?;
  }

  info!("Seed data in place.");
  Ok(())
}

async fn seed_user(repos: &Repositories, email: &str, password: &str, first_name: &str, role: UserRole) -> Result<User> {
  if let Some(existing) = repos.users.find_by_email(email).await? {
    return Ok(existing);
  }
  repos
    .users
    .create(NewUser {
      email: email.to_string(),
      password_hash: hash_password(password)?,
      first_name: Some(first_name.to_string()),
      last_name: Some("User".to_string()),
      role,
    })
    .await
}

async fn seed_category(repos: &Repositories, name: &str, slug: &str, parent_id: Option<Uuid>) -> Result<Category> {
  let existing = repos.catalog.list_categories().await?.into_iter().find(|c| c.slug == slug);
  if let Some(category) = existing {
    return Ok(category);
  }
  repos
    .catalog
    .create_category(CategoryInput {
      name: Some(name.to_string()),
      slug: Some(slug.to_string()),
      description: None,
      parent_id,
      is_active: Some(true),
    })
    .await
}

fn templates() -> Vec<NewTemplate> {
  let t = |name: &str, subject: &str, body: &str| NewTemplate {
    name: name.to_string(),
    subject: subject.to_string(),
    body: body.to_string(),
  };
  vec![
    t(
      "order_created",
      "Your order {{orderNumber}} has been received",
      "<html><body><h1>Thank you, {{firstName}}!</h1>\
       <p>Your order <strong>{{orderNumber}}</strong> has been received.</p>\
       <p>Total: {{totalAmount}} {{currency}}</p></body></html>",
    ),
    t(
      "order_paid",
      "Payment received for order {{orderNumber}}",
      "<html><body><h1>Payment confirmed</h1>\
       <p>Hi {{firstName}}, we received your payment of {{totalAmount}} {{currency}} \
       for order <strong>{{orderNumber}}</strong>.</p></body></html>",
    ),
    t(
      "order_shipped",
      "Order {{orderNumber}} is on its way",
      "<html><body><h1>Your order has shipped</h1>\
       <p>Hi {{firstName}}, order <strong>{{orderNumber}}</strong> is on its way.</p>\
       <p>Tracking number: {{trackingNumber}}</p></body></html>",
    ),
    t(
      "password_reset",
      "Reset your password",
      "<html><body><p>Hi {{firstName}},</p>\
       <p>Use the link below to reset your password:</p>\
       <p><a href=\"{{resetLink}}\">{{resetLink}}</a></p></body></html>",
    ),
  ]
}
