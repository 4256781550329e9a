//! Periodic notification duties.
//!
//! Two independent jobs run on every tick: the dispatch scan (send
//! scheduled notifications whose time has arrived) and the retention sweep
//! (retire expired and aged-out notifications). Both operate through
//! status-guarded queries and per-row transitions, so they are idempotent
//! and safe to run concurrently across worker processes.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sportiq_engine::dispatch::DeliveryOrchestrator;

pub struct Scheduler {
    pool: PgPool,
    orchestrator: DeliveryOrchestrator,
    poll_interval: Duration,
    retention_days: i64,
}

impl Scheduler {
    pub fn new(
        pool: PgPool,
        orchestrator: DeliveryOrchestrator,
        poll_interval: Duration,
        retention_days: i64,
    ) -> Self {
        Self {
            pool,
            orchestrator,
            poll_interval,
            retention_days,
        }
    }

    /// Run both duties forever. A failing tick is logged and never breaks
    /// the loop.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            retention_days = self.retention_days,
            "Scheduler started"
        );

        loop {
            ticker.tick().await;

            if let Err(e) = self.dispatch_due().await {
                tracing::error!(error = %e, "Dispatch scan failed");
            }
            if let Err(e) = self.retention_sweep().await {
                tracing::error!(error = %e, "Retention sweep failed");
            }
        }
    }

    /// Dispatch every scheduled notification whose send time has arrived.
    /// One notification's failure does not block the rest of the scan.
    pub async fn dispatch_due(&self) -> anyhow::Result<u32> {
        let due: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM notifications
            WHERE status = 'scheduled' AND send_at <= NOW()
            ORDER BY send_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut dispatched = 0u32;
        for (id,) in due {
            match self.orchestrator.dispatch(id).await {
                Ok(summary) => {
                    dispatched += 1;
                    tracing::info!(
                        notification_id = %id,
                        status = %summary.status,
                        delivered = summary.delivered,
                        failed = summary.failed,
                        "Scheduled notification dispatched"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        notification_id = %id,
                        error = %e,
                        "Failed to dispatch scheduled notification"
                    );
                }
            }
        }

        Ok(dispatched)
    }

    /// Retire old notifications in two phases: first expire sent
    /// auto-expiring notifications whose expiry has passed, then delete
    /// expired and aged-out rows. The deleted count is reported, not
    /// retried.
    pub async fn retention_sweep(&self) -> anyhow::Result<u64> {
        let expired = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'sent'
              AND (settings->>'auto_expire')::boolean
              AND expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        let cutoff = Utc::now() - ChronoDuration::days(self.retention_days);
        let deleted = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE ((settings->>'auto_expire')::boolean AND expires_at < NOW())
               OR (status = 'sent' AND created_at < $1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if expired > 0 || deleted > 0 {
            tracing::info!(expired, deleted, "Retention sweep completed");
        }

        Ok(deleted)
    }
}
