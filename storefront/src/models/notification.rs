// storefront/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
  Pending,
  Sent,
  Failed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTemplate {
  pub id: Uuid,
  pub name: String,
  pub kind: String,
  pub subject: Option<String>,
  pub body: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
  pub name: String,
  pub subject: String,
  pub body: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLog {
  pub id: Uuid,
  pub template_id: Option<Uuid>,
  pub recipient: String,
  pub subject: String,
  pub body: String,
  pub status: NotificationStatus,
  pub error: Option<String>,
  pub provider_message_id: Option<String>,
  pub metadata: serde_json::Value,
  pub sent_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotificationLog {
  pub template_id: Option<Uuid>,
  pub recipient: String,
  pub subject: String,
  pub body: String,
  pub status: NotificationStatus,
  pub error: Option<String>,
  pub metadata: serde_json::Value,
}
