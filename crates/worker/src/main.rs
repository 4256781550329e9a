use std::sync::Arc;
use std::time::Duration;

use sportiq_common::config::AppConfig;
use sportiq_common::db;
use sportiq_common::redis_pool::create_redis_pool;
use sportiq_engine::dispatch::DeliveryOrchestrator;
use sportiq_notifier::SenderRegistry;
use sportiq_worker::scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportiq_worker=info,sportiq_engine=debug".into()),
        )
        .json()
        .init();

    tracing::info!("SportIQ notification worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Wire up delivery transports
    let redis = create_redis_pool(&config.redis_url).await?;
    let senders = Arc::new(SenderRegistry::from_config(&config, redis));
    let orchestrator = DeliveryOrchestrator::new(
        pool.clone(),
        senders,
        Duration::from_secs(config.send_timeout_secs),
    );

    let scheduler = Scheduler::new(
        pool,
        orchestrator,
        Duration::from_secs(config.scheduler_poll_interval_secs),
        config.retention_days,
    );

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = scheduler.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Scheduler exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("SportIQ notification worker stopped.");
    Ok(())
}
