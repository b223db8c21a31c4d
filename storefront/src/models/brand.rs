// storefront/src/models/brand.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
