// tests/notification_api_tests.rs

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use common::*;
use serde_json::json;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::models::NotificationStatus;
use storefront::services::payment_provider::MockPaymentProvider;

#[actix_web::test]
async fn send_email_is_admin_only() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let body = json!({ "to": "someone@example.com", "template": "order_created", "data": {} });

  let (status, _) = call_json!(app, TestRequest::post().uri("/api/v1/notifications/send-email").set_json(&body));
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let user = user_token(&state).await;
  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/notifications/send-email")
      .insert_header(bearer(&user))
      .set_json(&body)
  );
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn known_template_is_rendered_and_logged() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let admin = admin_token(&state).await;

  let (status, body) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/notifications/send-email")
      .insert_header(bearer(&admin))
      .set_json(json!({
        "to": "buyer@example.com",
        "template": "order_paid",
        "data": { "firstName": "Ada", "orderNumber": "ORD-20240101-ABCDEF12", "totalAmount": "10.00", "currency": "TRY" }
      }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "success": true }));

  let logs = state.repos.notifications.list_logs_for("buyer@example.com").await.unwrap();
  assert_eq!(logs.len(), 1);
  let log = &logs[0];
  assert_eq!(log.status, NotificationStatus::Sent);
  assert_eq!(log.subject, "Payment received for order ORD-20240101-ABCDEF12");
  assert!(log.body.contains("Hi Ada"));
  assert!(log.body.contains("10.00 TRY"));
  assert!(log.template_id.is_some());
  assert!(log.provider_message_id.as_deref().unwrap_or_default().starts_with("msg_"));
  assert!(log.sent_at.is_some());
}

#[actix_web::test]
async fn unknown_template_falls_back_to_a_data_dump() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let admin = admin_token(&state).await;

  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/notifications/send-email")
      .insert_header(bearer(&admin))
      .set_json(json!({ "to": "x@example.com", "subject": "Hello", "template": "welcome", "data": { "k": 1 } }))
  );
  assert_eq!(status, StatusCode::OK);

  let logs = state.repos.notifications.list_logs_for("x@example.com").await.unwrap();
  assert_eq!(logs[0].subject, "Hello");
  assert_eq!(logs[0].body, r#"<html><body>Template: welcome, Data: {"k":1}</body></html>"#);
  assert!(logs[0].template_id.is_none());
}

#[actix_web::test]
async fn send_email_validates_and_reports_delivery_failures() {
  let config = AppConfig::for_tests();
  let state = seeded_state_with_providers(Arc::new(MockPaymentProvider::new(&config.payment)), Arc::new(FailingMailer)).await;
  let app = test_app!(state);
  let admin = admin_token(&state).await;

  let (status, err) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/notifications/send-email")
      .insert_header(bearer(&admin))
      .set_json(json!({ "template": "order_paid" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "to and template are required");

  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/notifications/send-email")
      .insert_header(bearer(&admin))
      .set_json(json!({ "to": "buyer@example.com", "template": "order_paid", "data": {} }))
  );
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

  let logs = state.repos.notifications.list_logs_for("buyer@example.com").await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].status, NotificationStatus::Failed);
  assert!(logs[0].sent_at.is_none());
}
