//! Shared application state for the Axum API server.

use std::sync::Arc;

use sqlx::PgPool;

use sportiq_common::config::AppConfig;
use sportiq_engine::audience::Directory;
use sportiq_engine::dispatch::DeliveryOrchestrator;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub orchestrator: DeliveryOrchestrator,
    pub directory: Arc<dyn Directory>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        orchestrator: DeliveryOrchestrator,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            pool,
            config,
            orchestrator,
            directory,
        }
    }
}
