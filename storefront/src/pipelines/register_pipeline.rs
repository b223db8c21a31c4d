// storefront/src/pipelines/register_pipeline.rs

use crate::errors::AppError;
use crate::models::{NewUser, UserRole};
use crate::pipelines::contexts::RegisterCtx;
use crate::services::auth_service;
use crate::store::USER_EXISTS;
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn register_register_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<RegisterCtx, AppError>::new([
    StepDef::required("validate_input"),
    StepDef::required("check_email_available"),
    StepDef::required("hash_password"),
    StepDef::required("create_user"),
  ]);

  p.on("validate_input", |ctx: FlowContext<RegisterCtx>| {
    Box::pin(async move {
      let (raw_email, password) = {
        let guard = ctx.read();
        (guard.email.clone(), guard.password.clone())
      };
      let email = auth_service::normalize_email(&raw_email)?;
      auth_service::validate_password(&password)?;
      debug!(%email, "Registration input valid.");
      ctx.write().email = email;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("check_email_available", |ctx: FlowContext<RegisterCtx>| {
    Box::pin(async move {
      let (email, repos) = {
        let guard = ctx.read();
        (guard.email.clone(), guard.app_state.repos.clone())
      };
      if repos.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "Registration with an existing email.");
        return Err(AppError::validation(USER_EXISTS));
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("hash_password", |ctx: FlowContext<RegisterCtx>| {
    Box::pin(async move {
      let password = ctx.read().password.clone();
      let hash = auth_service::hash_password(&password)?;
      let mut guard = ctx.write();
      guard.password_hash = Some(hash);
      guard.password.clear();
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("create_user", |ctx: FlowContext<RegisterCtx>| {
    Box::pin(async move {
      let (new_user, repos) = {
        let guard = ctx.read();
        let password_hash = guard
          .password_hash
          .clone()
          .ok_or_else(|| AppError::Internal("Password was not hashed before create_user".into()))?;
        let new_user = NewUser {
          email: guard.email.clone(),
          password_hash,
          first_name: guard.first_name.clone(),
          last_name: guard.last_name.clone(),
          role: UserRole::User,
        };
        (new_user, guard.app_state.repos.clone())
      };
      let user = repos.users.create(new_user).await?;
      info!(user_id = %user.id, "User registered.");
      ctx.write().user = Some(user);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  conductor.register(p);
}
