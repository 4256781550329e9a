//! SportIQ notification API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sportiq_api::routes::create_router;
use sportiq_api::state::AppState;
use sportiq_common::config::AppConfig;
use sportiq_common::db::create_pool;
use sportiq_common::redis_pool::create_redis_pool;
use sportiq_engine::audience::PgDirectory;
use sportiq_engine::dispatch::DeliveryOrchestrator;
use sportiq_notifier::SenderRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("sportiq_api=debug,sportiq_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting SportIQ notification API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Create Redis connection (web channel delivery)
    let redis = create_redis_pool(&config.redis_url).await?;
    tracing::info!("Redis connection established");

    // Wire up delivery transports and the orchestrator
    let senders = Arc::new(SenderRegistry::from_config(&config, redis));
    let orchestrator = DeliveryOrchestrator::new(
        pool.clone(),
        senders,
        Duration::from_secs(config.send_timeout_secs),
    );
    let directory = Arc::new(PgDirectory::new(pool.clone()));

    // Build application state
    let state = AppState::new(pool, config, orchestrator, directory);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
