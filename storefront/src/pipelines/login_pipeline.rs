// storefront/src/pipelines/login_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::LoginCtx;
use crate::services::auth_service;
use shopflow::{Conductor, FlowContext, Pipeline, StepControl, StepDef};
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn register_login_pipeline(conductor: &Arc<Conductor<AppError>>) {
  let mut p = Pipeline::<LoginCtx, AppError>::new([
    StepDef::required("load_user"),
    StepDef::required("verify_password"),
    StepDef::required("issue_tokens"),
  ]);

  p.on("load_user", |ctx: FlowContext<LoginCtx>| {
    Box::pin(async move {
      let (email, repos) = {
        let guard = ctx.read();
        (guard.email.trim().to_lowercase(), guard.app_state.repos.clone())
      };
      let Some(user) = repos.users.find_by_email(&email).await? else {
        warn!("Login for unknown email.");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
      };
      ctx.write().user = Some(user);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("verify_password", |ctx: FlowContext<LoginCtx>| {
    Box::pin(async move {
      let (stored_hash, password) = {
        let guard = ctx.read();
        let hash = guard.user.as_ref().map(|u| u.password_hash.clone()).unwrap_or_default();
        (hash, guard.password.clone())
      };
      if !auth_service::verify_password(&stored_hash, &password)? {
        warn!("Login with a wrong password.");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
      }
      ctx.write().password.clear();
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  p.on("issue_tokens", |ctx: FlowContext<LoginCtx>| {
    Box::pin(async move {
      let (user, tokens) = {
        let guard = ctx.read();
        (guard.user.clone(), guard.app_state.tokens.clone())
      };
      let user = user.ok_or_else(|| AppError::Internal("No user loaded before issue_tokens".into()))?;
      let pair = tokens.issue_pair(&user)?;
      info!(user_id = %user.id, role = user.role.as_str(), "User logged in.");
      ctx.write().tokens = Some(pair);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  conductor.register(p);
}
