// storefront/src/lib.rs

//! Storefront backend: catalog, carts, orders, payments and notifications
//! over one HTTP surface. Multi-step flows run as `shopflow` pipelines.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::Result;
use crate::state::AppState;
use crate::store::{postgres::MIGRATOR, seed, Repositories};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Connects the configured store, applies migrations and seed data as
/// requested, and wires up pipelines and providers.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
  let repos = match config.store_backend {
    StoreBackend::Memory => {
      info!("Using in-memory store.");
      Repositories::memory()
    }
    StoreBackend::Postgres => {
      let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
      info!(max_connections = config.database_max_connections, "Connected to the database.");
      if config.run_migrations {
        MIGRATOR.run(&pool).await?;
        info!("Database migrations applied.");
      }
      Repositories::postgres(pool)
    }
  };

  if config.seed_db {
    seed::seed(&repos, &config.default_currency).await?;
  }

  Ok(AppState::new(config, repos))
}
