// tests/common/mod.rs
#![allow(dead_code, unused_macros)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::errors::{AppError, Result};
use storefront::models::{Cart, CartOwner};
use storefront::services::cart_service;
use storefront::services::email_provider::{EmailProvider, OutboundEmail};
use storefront::services::payment_provider::{PaymentProvider, ProviderIntent};
use storefront::state::AppState;
use storefront::store::seed::{self, ADMIN_EMAIL, USER_EMAIL};
use storefront::store::Repositories;
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Seeded in-memory state with the local providers.
pub async fn seeded_state() -> AppState {
  seeded_state_with(AppConfig::for_tests()).await
}

pub async fn seeded_state_with(config: AppConfig) -> AppState {
  setup_tracing();
  storefront::build_state(config).await.expect("seeded state")
}

/// Seeded in-memory state with the given providers.
pub async fn seeded_state_with_providers(
  payments: Arc<dyn PaymentProvider>,
  mailer: Arc<dyn EmailProvider>,
) -> AppState {
  setup_tracing();
  let config = AppConfig::for_tests();
  let repos = Repositories::memory();
  seed::seed(&repos, &config.default_currency).await.expect("seed");
  AppState::with_providers(config, repos, payments, mailer)
}

/// Provider that is always down.
pub struct FailingPayments;

#[async_trait]
impl PaymentProvider for FailingPayments {
  fn name(&self) -> &str {
    "failing"
  }

  async fn create_intent(&self, _order_id: Uuid, _amount: Decimal, _currency: &str) -> Result<ProviderIntent> {
    Err(AppError::Internal("payment provider unavailable".into()))
  }
}

/// Mailer that rejects every message.
pub struct FailingMailer;

#[async_trait]
impl EmailProvider for FailingMailer {
  async fn send(&self, _email: &OutboundEmail) -> Result<String> {
    Err(AppError::Internal("smtp connection refused".into()))
  }
}

/// Access token for a seeded or registered account, issued without the login endpoint.
pub async fn token_for(state: &AppState, email: &str) -> String {
  let user = state
    .repos
    .users
    .find_by_email(email)
    .await
    .expect("user lookup")
    .expect("user exists");
  state.tokens.issue_pair(&user).expect("token pair").access_token
}

pub async fn admin_token(state: &AppState) -> String {
  token_for(state, ADMIN_EMAIL).await
}

pub async fn user_token(state: &AppState) -> String {
  token_for(state, USER_EMAIL).await
}

/// Puts `lines` of seeded products into the account's cart.
pub async fn fill_cart(state: &AppState, email: &str, lines: &[(&str, i32)]) -> Cart {
  let user = state.repos.users.find_by_email(email).await.unwrap().unwrap();
  let mut cart = cart_service::get_or_create(&state.repos, &CartOwner::User(user.id), "TRY")
    .await
    .unwrap();
  for (slug, quantity) in lines {
    let product = state.repos.catalog.find_product_by_slug(slug).await.unwrap().unwrap();
    cart = state
      .repos
      .carts
      .upsert_item(cart.id, product.id, None, *quantity, product.price)
      .await
      .unwrap();
  }
  cart
}

/// Money goes over the wire as a JSON number.
pub fn assert_amount(value: &serde_json::Value, expected: f64) {
  let actual = value.as_f64().unwrap_or_else(|| panic!("not a number: {}", value));
  assert!((actual - expected).abs() < 1e-6, "expected {}, got {}", expected, actual);
}

pub fn bearer(token: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token))
}

/// Builds the routed app around `$state`.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(storefront::web::configure_app_routes),
    )
    .await
  };
}

/// Sends a `TestRequest` and returns the status with the JSON body (`Null` when empty).
macro_rules! call_json {
  ($app:expr, $req:expr) => {{
    let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
    let status = resp.status();
    let body = actix_web::test::read_body(resp).await;
    let json: serde_json::Value = if body.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&body).expect("json body")
    };
    (status, json)
  }};
}
