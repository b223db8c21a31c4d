// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::email_provider::{EmailProvider, LogEmailProvider};
use crate::services::payment_provider::{MockPaymentProvider, PaymentProvider};
use crate::services::token_service::TokenService;
use crate::store::Repositories;
use shopflow::Conductor;
use std::sync::Arc;

/// Everything a handler or pipeline step needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
  pub repos: Repositories,
  pub flows: Arc<Conductor<AppError>>,
  pub config: Arc<AppConfig>,
  pub tokens: Arc<TokenService>,
  pub payments: Arc<dyn PaymentProvider>,
  pub mailer: Arc<dyn EmailProvider>,
}

impl AppState {
  /// State with the local payment and email providers.
  pub fn new(config: AppConfig, repos: Repositories) -> Self {
    let payments = Arc::new(MockPaymentProvider::new(&config.payment));
    let mailer = Arc::new(LogEmailProvider::new(&config.email));
    Self::with_providers(config, repos, payments, mailer)
  }

  /// Builds the state and registers every pipeline with its conductor.
  pub fn with_providers(
    config: AppConfig,
    repos: Repositories,
    payments: Arc<dyn PaymentProvider>,
    mailer: Arc<dyn EmailProvider>,
  ) -> Self {
    let flows = Arc::new(Conductor::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      repos,
      flows,
      tokens: Arc::new(TokenService::new(&config.jwt)),
      config: Arc::new(config),
      payments,
      mailer,
    }
  }
}
