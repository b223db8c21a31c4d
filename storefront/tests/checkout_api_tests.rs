// tests/checkout_api_tests.rs

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use common::*;
use serde_json::json;
use std::sync::Arc;
use storefront::models::{NotificationStatus, OrderStatus, PaymentStatus};
use storefront::pipelines::checkout_pipeline::COMPENSATION_NOTE;
use storefront::services::email_provider::LogEmailProvider;
use storefront::services::payment_provider::MockPaymentProvider;
use storefront::store::seed::USER_EMAIL;

#[actix_web::test]
async fn checkout_creates_order_intent_and_confirmation() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 2)]).await;

  let (status, body) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/checkout").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["status"], "PENDING_PAYMENT");
  assert_amount(&body["order"]["totalAmount"], 99999.98);
  let intent_id = body["payment"]["paymentIntentId"].as_str().unwrap();
  assert!(body["payment"]["clientSecret"].is_string());

  let intent = state.repos.payments.find_by_provider_intent_id(intent_id).await.unwrap().unwrap();
  assert_eq!(intent.status, PaymentStatus::Pending);
  assert_eq!(intent.order_id.to_string(), body["order"]["id"].as_str().unwrap());

  let logs = state.repos.notifications.list_logs_for(USER_EMAIL).await.unwrap();
  let order_number = body["order"]["orderNumber"].as_str().unwrap();
  let confirmation = logs.iter().find(|l| l.subject.contains(order_number)).expect("confirmation email");
  assert_eq!(confirmation.status, NotificationStatus::Sent);
  assert!(confirmation.body.contains("Thank you, Test!"));
}

#[actix_web::test]
async fn checkout_needs_a_user_and_a_filled_cart() {
  let state = seeded_state().await;
  let app = test_app!(state);

  let (status, _) = call_json!(app, TestRequest::post().uri("/api/v1/checkout").set_json(json!({})));
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let token = user_token(&state).await;
  let (status, err) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/checkout").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "Cart not found");

  fill_cart(&state, USER_EMAIL, &[]).await;
  let (status, err) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/checkout").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "Cart is empty");
}

#[actix_web::test]
async fn malformed_checkout_bodies_create_nothing() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  for body in ["{garbage", r#"{"billingAddressId":true}"#] {
    let (status, err) = call_json!(
      app,
      TestRequest::post()
        .uri("/api/v1/checkout")
        .insert_header(bearer(&token))
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Invalid request body: "));
  }
  assert!(state.repos.orders.list(None).await.unwrap().is_empty());
  assert!(state.repos.notifications.list_logs_for(USER_EMAIL).await.unwrap().is_empty());
}

#[actix_web::test]
async fn checkout_accepts_an_anonymous_cart_by_id() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  let iphone = state.repos.catalog.find_product_by_slug("iphone-15-pro").await.unwrap().unwrap();

  let (_, cart) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/cart/items")
      .insert_header(("x-session-id", "guest-42"))
      .set_json(json!({ "productId": iphone.id, "quantity": 1 }))
  );
  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/checkout")
      .insert_header(bearer(&token))
      .set_json(json!({ "cartId": cart["id"] }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["items"][0]["sku"], "IPH15PRO001");
}

#[actix_web::test]
async fn failed_intent_cancels_the_draft() {
  let state = seeded_state_with_providers(
    Arc::new(FailingPayments),
    Arc::new(LogEmailProvider::new(&storefront::config::AppConfig::for_tests().email)),
  )
  .await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("samsung-galaxy-s24", 1)]).await;

  let (status, _) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/checkout").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

  let user = state.repos.users.find_by_email(USER_EMAIL).await.unwrap().unwrap();
  let orders = state.repos.orders.list(Some(user.id)).await.unwrap();
  assert_eq!(orders.len(), 1);
  let order = &orders[0];
  assert_eq!(order.status, OrderStatus::Cancelled);
  assert_eq!(order.status_history.last().map(|h| h.note.as_str()), Some(COMPENSATION_NOTE));
  assert!(state.repos.notifications.list_logs_for(USER_EMAIL).await.unwrap().is_empty());
}

#[actix_web::test]
async fn confirmation_failure_does_not_fail_checkout() {
  let config = storefront::config::AppConfig::for_tests();
  let state = seeded_state_with_providers(
    Arc::new(MockPaymentProvider::new(&config.payment)),
    Arc::new(FailingMailer),
  )
  .await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  let (status, body) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/checkout").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["status"], "PENDING_PAYMENT");

  let logs = state.repos.notifications.list_logs_for(USER_EMAIL).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].status, NotificationStatus::Failed);
  assert!(logs[0].error.as_deref().unwrap_or_default().contains("smtp connection refused"));
}
