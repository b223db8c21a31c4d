// storefront/src/services/email_provider.rs

use crate::config::EmailConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OutboundEmail {
  pub to: String,
  pub subject: String,
  pub html_body: String,
}

/// Delivery backend for rendered emails. Returns the provider's message id.
#[async_trait]
pub trait EmailProvider: Send + Sync {
  async fn send(&self, email: &OutboundEmail) -> Result<String>;
}

/// Writes the email to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogEmailProvider {
  from: String,
  smtp_host: Option<String>,
}

impl LogEmailProvider {
  pub fn new(config: &EmailConfig) -> Self {
    Self {
      from: config.from.clone(),
      smtp_host: config.smtp_host.clone(),
    }
  }
}

#[async_trait]
impl EmailProvider for LogEmailProvider {
  #[instrument(name = "email::send", skip(self, email), fields(to = %email.to))]
  async fn send(&self, email: &OutboundEmail) -> Result<String> {
    if email.to.trim().is_empty() {
      return Err(AppError::validation("Recipient is required"));
    }
    let preview: String = email.html_body.chars().take(60).collect();
    let message_id = format!("msg_{}", Uuid::new_v4().simple());
    info!(
      from = %self.from,
      smtp_host = self.smtp_host.as_deref().unwrap_or("none"),
      subject = %email.subject,
      %preview,
      %message_id,
      "Email accepted by log provider."
    );
    Ok(message_id)
  }
}
