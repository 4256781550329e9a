//! Derived notification statistics.
//!
//! Statistics are never written directly. `recompute` derives them from the
//! recipient rows and must run inside the same transaction as whichever
//! write touched those rows, so they can never drift.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use sportiq_common::error::AppError;

/// Recompute one notification's statistics from its recipient rows.
///
/// sent = any non-pending recipient; delivered includes read; rates are
/// percentages over the total recipient count (zero when empty).
pub async fn recompute<'e, E>(executor: E, notification_id: Uuid) -> Result<(), AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE notifications n
        SET total_recipients = s.total,
            sent_count = s.sent,
            delivered_count = s.delivered,
            read_count = s.read_cnt,
            acknowledged_count = s.acked,
            failed_count = s.failed,
            open_rate = CASE WHEN s.total > 0
                THEN s.read_cnt::float8 / s.total::float8 * 100.0 ELSE 0 END,
            response_rate = CASE WHEN s.total > 0
                THEN s.acked::float8 / s.total::float8 * 100.0 ELSE 0 END,
            updated_at = NOW()
        FROM (
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE delivery_status <> 'pending') AS sent,
                   COUNT(*) FILTER (WHERE delivery_status IN ('delivered', 'read')) AS delivered,
                   COUNT(*) FILTER (WHERE delivery_status = 'read') AS read_cnt,
                   COUNT(*) FILTER (WHERE acknowledged) AS acked,
                   COUNT(*) FILTER (WHERE delivery_status = 'failed') AS failed
            FROM notification_recipients
            WHERE notification_id = $1
        ) s
        WHERE n.id = $1
        "#,
    )
    .bind(notification_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// One bucket of the grouped overview counters.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
    pub recipients: i64,
}

/// Aggregate counters for the admin stats dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub total_notifications: i64,
    pub total_recipients: i64,
    pub total_sent: i64,
    pub total_delivered: i64,
    pub total_read: i64,
    pub total_acknowledged: i64,
    pub total_failed: i64,
    pub by_type: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
}

pub struct StatsService;

impl StatsService {
    /// Aggregate counters over an optional creation-date range.
    pub async fn overview(
        pool: &PgPool,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<StatsOverview, AppError> {
        let totals: (i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total_recipients), 0)::bigint,
                   COALESCE(SUM(sent_count), 0)::bigint,
                   COALESCE(SUM(delivered_count), 0)::bigint,
                   COALESCE(SUM(read_count), 0)::bigint,
                   COALESCE(SUM(acknowledged_count), 0)::bigint,
                   COALESCE(SUM(failed_count), 0)::bigint
            FROM notifications
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_one(pool)
        .await?;

        let by_type = Self::grouped(pool, "kind", start_date, end_date).await?;
        let by_priority = Self::grouped(pool, "priority", start_date, end_date).await?;
        let by_status = Self::grouped(pool, "status", start_date, end_date).await?;

        Ok(StatsOverview {
            total_notifications: totals.0,
            total_recipients: totals.1,
            total_sent: totals.2,
            total_delivered: totals.3,
            total_read: totals.4,
            total_acknowledged: totals.5,
            total_failed: totals.6,
            by_type,
            by_priority,
            by_status,
        })
    }

    async fn grouped(
        pool: &PgPool,
        column: &str,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<GroupCount>, AppError> {
        // `column` is one of three fixed names picked by the caller above,
        // never user input.
        let sql = format!(
            r#"
            SELECT {column} AS key,
                   COUNT(*) AS count,
                   COALESCE(SUM(total_recipients), 0)::bigint AS recipients
            FROM notifications
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            GROUP BY {column}
            ORDER BY count DESC
            "#
        );

        let rows = sqlx::query_as(&sql)
            .bind(start_date)
            .bind(end_date)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}
