// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub currency: String,
  pub sku: Option<String>,
  pub image: Option<String>,
  pub images: Vec<String>,
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub currency: Option<String>,
  pub sku: Option<String>,
  pub image: Option<String>,
  #[serde(default)]
  pub images: Vec<String>,
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  pub name: Option<String>,
  pub slug: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub currency: Option<String>,
  pub sku: Option<String>,
  pub image: Option<String>,
  pub images: Option<Vec<String>>,
  pub category_id: Option<Uuid>,
  pub brand_id: Option<Uuid>,
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProductFilter {
  pub category_id: Option<Uuid>,
  pub limit: i64,
  pub offset: i64,
}

impl ProductFilter {
  pub const DEFAULT_LIMIT: i64 = 20;
  pub const MAX_LIMIT: i64 = 100;

  pub fn new(category_id: Option<Uuid>, limit: Option<i64>, offset: Option<i64>) -> Self {
    Self {
      category_id,
      limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
      offset: offset.unwrap_or(0).max(0),
    }
  }
}
