// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CategoryInput, ProductFilter, ProductInput, ProductPatch};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
  pub category_id: Option<Uuid>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductListQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = ProductFilter::new(query.category_id, query.limit, query.offset);
  let products = app_state.repos.catalog.list_products(filter).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  slug: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .repos
    .catalog
    .find_product_by_slug(&slug)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;
  Ok(HttpResponse::Ok().json(product))
}

pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.repos.catalog.list_categories().await?))
}

pub async fn list_brands_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.repos.catalog.list_brands().await?))
}

fn check_price(price: Option<Decimal>) -> Result<(), AppError> {
  match price {
    Some(p) if p < Decimal::ZERO => Err(AppError::validation("Price must not be negative")),
    _ => Ok(()),
  }
}

// --- Admin ---

#[instrument(name = "handler::create_product", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id, slug = %payload.slug))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let input = payload.into_inner();
  if input.name.trim().is_empty() || input.slug.trim().is_empty() {
    return Err(AppError::validation("Name and slug are required"));
  }
  check_price(Some(input.price))?;
  let product = app_state
    .repos
    .catalog
    .create_product(input, &app_state.config.default_currency)
    .await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, _admin, payload))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  product_id: web::Path<Uuid>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let patch = payload.into_inner();
  check_price(patch.price)?;
  let product = app_state
    .repos
    .catalog
    .update_product(*product_id, patch)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, _admin))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  product_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.repos.catalog.deactivate_product(*product_id).await? {
    return Err(AppError::not_found("Product not found"));
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[instrument(name = "handler::create_category", skip(app_state, _admin, payload))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<CategoryInput>,
) -> Result<HttpResponse, AppError> {
  let category = app_state.repos.catalog.create_category(payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::update_category", skip(app_state, _admin, payload))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  category_id: web::Path<Uuid>,
  payload: web::Json<CategoryInput>,
) -> Result<HttpResponse, AppError> {
  let category = app_state
    .repos
    .catalog
    .update_category(*category_id, payload.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Category not found"))?;
  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::delete_category", skip(app_state, _admin))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  category_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.repos.catalog.deactivate_category(*category_id).await? {
    return Err(AppError::not_found("Category not found"));
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
