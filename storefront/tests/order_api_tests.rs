// tests/order_api_tests.rs

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use common::*;
use serde_json::{json, Value};
use storefront::models::NotificationStatus;
use storefront::store::seed::USER_EMAIL;

fn history_notes(order: &Value) -> Vec<String> {
  order["statusHistory"]
    .as_array()
    .unwrap()
    .iter()
    .map(|h| h["note"].as_str().unwrap().to_string())
    .collect()
}

#[actix_web::test]
async fn draft_is_built_from_the_users_cart() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;

  let (status, err) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "Cart not found");

  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1), ("samsung-galaxy-s24", 2)]).await;
  let user = state.repos.users.find_by_email(USER_EMAIL).await.unwrap().unwrap();
  let address = state.repos.users.list_addresses(user.id).await.unwrap().remove(0);

  let (status, order) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/orders/draft")
      .insert_header(bearer(&token))
      .set_json(json!({ "shippingAddressId": address.id }))
  );
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(order["status"], "PENDING_PAYMENT");
  assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));
  assert_amount(&order["totalAmount"], 129999.97);
  assert_amount(&order["shippingCost"], 0.0);
  assert_eq!(order["items"].as_array().map(Vec::len), Some(2));
  assert_eq!(order["shippingAddress"]["city"], "Istanbul");
  assert_eq!(order["shippingAddress"]["id"], json!(address.id));
  assert_eq!(order["billingAddress"], order["shippingAddress"]);
  assert_eq!(
    history_notes(&order),
    vec!["Order created".to_string(), "Status changed to PENDING_PAYMENT".to_string()]
  );

  let skus: Vec<&str> = order["items"].as_array().unwrap().iter().filter_map(|i| i["sku"].as_str()).collect();
  assert!(skus.contains(&"IPH15PRO001"));
  assert!(skus.contains(&"SGS24001"));
}

#[actix_web::test]
async fn malformed_draft_bodies_are_rejected() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  for body in [r#"{"cartId":"not-a-uuid","shippingAddressId":42}"#, "{garbage"] {
    let (status, err) = call_json!(
      app,
      TestRequest::post()
        .uri("/api/v1/orders/draft")
        .insert_header(bearer(&token))
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Invalid request body: "));
  }
  assert!(state.repos.orders.list(None).await.unwrap().is_empty());

  // No body at all still drafts from the user's own cart.
  let (status, order) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token))
  );
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(order["status"], "PENDING_PAYMENT");
}

#[actix_web::test]
async fn inline_and_missing_addresses() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  let (status, err) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/orders/draft")
      .insert_header(bearer(&token))
      .set_json(json!({ "shippingAddressId": uuid::Uuid::new_v4() }))
  );
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "Address not found");

  let (status, order) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/orders/draft")
      .insert_header(bearer(&token))
      .set_json(json!({
        "shippingAddress": { "firstName": "Ada", "lastName": "L", "addressLine1": "1 Road", "city": "Ankara", "postalCode": "06000" },
        "billingAddress": { "firstName": "Ada", "lastName": "L", "addressLine1": "2 Road", "city": "Izmir", "postalCode": "35000", "country": "DE" }
      }))
  );
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(order["shippingAddress"]["city"], "Ankara");
  assert_eq!(order["shippingAddress"]["country"], "TR");
  assert!(order["shippingAddress"]["id"].is_string());
  assert_eq!(order["billingAddress"]["country"], "DE");

  // Nothing given: a placeholder snapshot with a fresh id.
  let (_, order) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token)).set_json(json!({}))
  );
  assert_eq!(order["shippingAddress"]["country"], "TR");
  assert!(order["shippingAddress"]["id"].is_string());
}

#[actix_web::test]
async fn orders_are_visible_to_owner_and_admin_only() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  let (_, order) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token)).set_json(json!({}))
  );
  let uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

  let (status, fetched) = call_json!(app, TestRequest::get().uri(&uri).insert_header(bearer(&token)));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["id"], order["id"]);
  assert_eq!(fetched["items"].as_array().map(Vec::len), Some(1));

  let (status, _) = call_json!(
    app,
    TestRequest::post()
      .uri("/api/v1/auth/register")
      .set_json(json!({ "email": "other@example.com", "password": "secret1" }))
  );
  assert_eq!(status, StatusCode::CREATED);
  let other = token_for(&state, "other@example.com").await;

  let (status, err) = call_json!(app, TestRequest::get().uri(&uri).insert_header(bearer(&other)));
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "Order not found");

  let (_, mine) = call_json!(app, TestRequest::get().uri("/api/v1/orders").insert_header(bearer(&other)));
  assert_eq!(mine, json!([]));

  let admin = admin_token(&state).await;
  let (status, _) = call_json!(app, TestRequest::get().uri(&uri).insert_header(bearer(&admin)));
  assert_eq!(status, StatusCode::OK);
  let (_, all) = call_json!(app, TestRequest::get().uri("/api/v1/orders").insert_header(bearer(&admin)));
  assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn admin_walks_the_status_lifecycle() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  let admin = admin_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("samsung-galaxy-s24", 1)]).await;

  let (_, order) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token)).set_json(json!({}))
  );
  let status_uri = format!("/api/v1/orders/{}/status", order["id"].as_str().unwrap());

  let (status, _) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&token)).set_json(json!({ "status": "PAID" }))
  );
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, err) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({}))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "Status is required");

  let (status, err) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({ "status": "LOST" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "Invalid status");

  let (status, err) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({ "status": "SHIPPED" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["error"], "Cannot transition order from PENDING_PAYMENT to SHIPPED");

  let (status, paid) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({ "status": "PAID" }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(paid["status"], "PAID");

  let (status, shipped) = call_json!(
    app,
    TestRequest::put()
      .uri(&status_uri)
      .insert_header(bearer(&admin))
      .set_json(json!({ "status": "SHIPPED", "note": "TRK-778899" }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(shipped["status"], "SHIPPED");
  assert_eq!(history_notes(&shipped).last().map(String::as_str), Some("TRK-778899"));

  let logs = state.repos.notifications.list_logs_for(USER_EMAIL).await.unwrap();
  let shipped_mail = logs
    .iter()
    .find(|l| l.body.contains("TRK-778899"))
    .expect("shipping email");
  assert_eq!(shipped_mail.status, NotificationStatus::Sent);
  assert!(shipped_mail.subject.contains(order["orderNumber"].as_str().unwrap()));

  let (_, done) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({ "status": "completed" }))
  );
  assert_eq!(done["status"], "COMPLETED");

  let (status, _) = call_json!(
    app,
    TestRequest::put().uri(&status_uri).insert_header(bearer(&admin)).set_json(json!({ "status": "CANCELLED" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn mark_paid_is_admin_only_and_repeatable() {
  let state = seeded_state().await;
  let app = test_app!(state);
  let token = user_token(&state).await;
  let admin = admin_token(&state).await;
  fill_cart(&state, USER_EMAIL, &[("iphone-15-pro", 1)]).await;

  let (_, order) = call_json!(
    app,
    TestRequest::post().uri("/api/v1/orders/draft").insert_header(bearer(&token)).set_json(json!({}))
  );
  let uri = format!("/api/v1/orders/{}/mark-paid", order["id"].as_str().unwrap());

  let (status, _) = call_json!(app, TestRequest::patch().uri(&uri).insert_header(bearer(&token)));
  assert_eq!(status, StatusCode::FORBIDDEN);

  for _ in 0..2 {
    let (status, paid) = call_json!(app, TestRequest::patch().uri(&uri).insert_header(bearer(&admin)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "PAID");
  }

  let (status, err) = call_json!(
    app,
    TestRequest::patch()
      .uri(&format!("/api/v1/orders/{}/mark-paid", uuid::Uuid::new_v4()))
      .insert_header(bearer(&admin))
  );
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["error"], "Order not found");
}
