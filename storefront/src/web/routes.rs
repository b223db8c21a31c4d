// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::web::handlers::{
  auth_handlers, cart_handlers, catalog_handlers, checkout_handlers, notification_handlers, order_handlers,
  payment_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok", "service": "storefront" }))
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::validation(format!("Invalid request body: {}", err)).into()
}

/// Mounts `/health` and the `/api/v1` surface. Used by `main.rs` and the
/// HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/api/v1")
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/refresh", web::post().to(auth_handlers::refresh_handler))
            .route("/me", web::get().to(auth_handlers::me_handler))
            .route("/addresses", web::get().to(auth_handlers::list_addresses_handler))
            .route("/addresses", web::post().to(auth_handlers::create_address_handler)),
        )
        .route("/products", web::get().to(catalog_handlers::list_products_handler))
        .route("/products/{slug}", web::get().to(catalog_handlers::get_product_handler))
        .route("/categories", web::get().to(catalog_handlers::list_categories_handler))
        .route("/brands", web::get().to(catalog_handlers::list_brands_handler))
        .service(
          web::scope("/admin")
            .route("/products", web::post().to(catalog_handlers::create_product_handler))
            .route("/products/{id}", web::put().to(catalog_handlers::update_product_handler))
            .route("/products/{id}", web::delete().to(catalog_handlers::delete_product_handler))
            .route("/categories", web::post().to(catalog_handlers::create_category_handler))
            .route("/categories/{id}", web::put().to(catalog_handlers::update_category_handler))
            .route("/categories/{id}", web::delete().to(catalog_handlers::delete_category_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("/items", web::post().to(cart_handlers::add_item_handler))
            .route("/items/{id}", web::patch().to(cart_handlers::update_item_handler))
            .route("/items/{id}", web::delete().to(cart_handlers::remove_item_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/draft", web::post().to(order_handlers::create_draft_handler))
            .route("/{id}", web::get().to(order_handlers::get_order_handler))
            .route("/{id}/mark-paid", web::patch().to(order_handlers::mark_paid_handler))
            .route("/{id}/status", web::put().to(order_handlers::update_status_handler)),
        )
        .service(
          web::scope("/payments")
            .route("/create-intent", web::post().to(payment_handlers::create_intent_handler))
            .route("/webhook", web::post().to(payment_handlers::webhook_handler)),
        )
        .route(
          "/notifications/send-email",
          web::post().to(notification_handlers::send_email_handler),
        )
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler)),
    );
}
