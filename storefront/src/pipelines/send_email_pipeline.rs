// storefront/src/pipelines/send_email_pipeline.rs

use crate::errors::AppError;
use crate::models::{NewNotificationLog, NotificationStatus};
use crate::pipelines::contexts::SendEmailCtx;
use crate::services::email_provider::OutboundEmail;
use crate::services::templates;
use chrono::Utc;
use serde_json::json;
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn register_send_email_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<SendEmailCtx, AppError>::new([
    StepDef::required("load_template"),
    StepDef::required("render"),
    StepDef::required("record_pending"),
    StepDef::required("deliver"),
  ]);

  p.on("load_template", |ctx: FlowContext<SendEmailCtx>| {
    Box::pin(async move {
      let (name, repos) = {
        let guard = ctx.read();
        (guard.request.template.clone(), guard.app_state.repos.clone())
      };
      let template = repos.notifications.find_template_by_name(&name).await?;
      if template.is_none() {
        debug!(template = %name, "Unknown template, using the fallback body.");
      }
      ctx.write().template = template;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("render", |ctx: FlowContext<SendEmailCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      let data = &guard.request.data;
      let subject_source = guard
        .template
        .as_ref()
        .and_then(|t| t.subject.clone())
        .or_else(|| guard.request.subject.clone())
        .unwrap_or_else(|| guard.request.template.clone());
      let subject = templates::render(&subject_source, data);
      let body = match &guard.template {
        Some(t) => templates::render(&t.body, data),
        None => templates::fallback_body(&guard.request.template, data),
      };
      guard.subject = subject;
      guard.body = body;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("record_pending", |ctx: FlowContext<SendEmailCtx>| {
    Box::pin(async move {
      let (entry, repos) = {
        let guard = ctx.read();
        let entry = NewNotificationLog {
          template_id: guard.template.as_ref().map(|t| t.id),
          recipient: guard.request.to.trim().to_string(),
          subject: guard.subject.clone(),
          body: guard.body.clone(),
          status: NotificationStatus::Pending,
          error: None,
          metadata: json!({ "template": guard.request.template, "data": guard.request.data }),
        };
        (entry, guard.app_state.repos.clone())
      };
      let log = repos.notifications.create_log(entry).await?;
      ctx.write().log = Some(log);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("deliver", |ctx: FlowContext<SendEmailCtx>| {
    Box::pin(async move {
      let (log, state) = {
        let guard = ctx.read();
        (guard.log.clone(), guard.app_state.clone())
      };
      let log = log.ok_or_else(|| AppError::Internal("No notification log before deliver".into()))?;
      let email = OutboundEmail {
        to: log.recipient.clone(),
        subject: log.subject.clone(),
        html_body: log.body.clone(),
      };

      match state.mailer.send(&email).await {
        Ok(message_id) => {
          state
            .repos
            .notifications
            .update_log_status(log.id, NotificationStatus::Sent, None, Some(message_id.clone()))
            .await?;
          info!(log_id = %log.id, %message_id, "Email sent.");
          if let Some(stored) = ctx.write().log.as_mut() {
            stored.status = NotificationStatus::Sent;
            stored.provider_message_id = Some(message_id);
            stored.sent_at = Some(Utc::now());
          }
          Ok(StepControl::Continue)
        }
        Err(send_err) => {
          warn!(log_id = %log.id, error = %send_err, "Email delivery failed.");
          state
            .repos
            .notifications
            .update_log_status(log.id, NotificationStatus::Failed, Some(send_err.to_string()), None)
            .await?;
          Err::<StepControl, AppError>(send_err)
        }
      }
    })
  });

  conductor.register(p);
}
