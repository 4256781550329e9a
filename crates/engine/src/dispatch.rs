//! Delivery orchestration.
//!
//! Fans a notification out across every (recipient × enabled-channel) pair,
//! filtered per pair by the recipient's subscription preferences, and drives
//! the notification to a terminal status. Every pair is an independent
//! concurrent send with no ordering guarantee; the orchestrator waits for
//! the complete set to settle before finalizing. A channel failure (or
//! timeout) is recorded on that channel row and never aborts the batch —
//! but any failure anywhere marks the whole notification `failed`.
//!
//! In-flight sends cannot be cancelled; a notification is only retried
//! afterwards by re-invoking `dispatch` from the `failed` status.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{
    Channel, DeliveryChannelState, Notification, NotificationStatus, Recipient,
};
use sportiq_notifier::{DeliveryRequest, SenderRegistry};

use crate::preferences::{SubscriptionStore, should_send};
use crate::stats;

/// Result of one dispatch run. Channel-level errors are recorded in the
/// model only; this summary carries counts for logging and the API reply.
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    pub notification_id: Uuid,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub filtered: usize,
    pub status: NotificationStatus,
}

struct DispatchOutcome {
    user_id: Uuid,
    channel: Channel,
    result: Result<(), String>,
}

/// Stateless dispatch driver with injected transports.
#[derive(Clone)]
pub struct DeliveryOrchestrator {
    pool: PgPool,
    senders: Arc<SenderRegistry>,
    send_timeout: Duration,
}

impl DeliveryOrchestrator {
    pub fn new(pool: PgPool, senders: Arc<SenderRegistry>, send_timeout: Duration) -> Self {
        Self {
            pool,
            senders,
            send_timeout,
        }
    }

    /// Drive one notification from draft/scheduled/failed to sent/failed.
    pub async fn dispatch(&self, notification_id: Uuid) -> Result<DispatchSummary, AppError> {
        let notification: Notification =
            sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
                .bind(notification_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Notification {} not found", notification_id))
                })?;

        if !notification.status.is_dispatchable() {
            return Err(AppError::StateConflict(format!(
                "Notification in status '{}' cannot be sent",
                notification.status
            )));
        }

        // Claim the notification. The status guard makes concurrent dispatch
        // attempts (API send + scheduler scan) settle on a single winner.
        let claimed = sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'sending', sent_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'scheduled', 'failed')
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::StateConflict(format!(
                "Notification {} is already being dispatched",
                notification_id
            )));
        }

        let recipients: Vec<Recipient> = sqlx::query_as(
            "SELECT * FROM notification_recipients WHERE notification_id = $1 ORDER BY user_id",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?;

        // Retry re-dispatches pending and failed channels; delivered ones stay.
        let channel_rows: Vec<DeliveryChannelState> = sqlx::query_as(
            r#"
            SELECT * FROM recipient_channels
            WHERE notification_id = $1 AND status <> 'delivered'
            "#,
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?;

        let mut channels_by_user: HashMap<Uuid, Vec<Channel>> = HashMap::new();
        for row in &channel_rows {
            channels_by_user.entry(row.user_id).or_default().push(row.channel);
        }

        let mut tasks: JoinSet<DispatchOutcome> = JoinSet::new();
        let mut attempted = 0usize;
        let mut filtered = 0usize;
        let local_now = Local::now().time();

        for recipient in &recipients {
            let Some(channels) = channels_by_user.get(&recipient.user_id) else {
                continue;
            };

            // Preferences are read at send time so changes between creation
            // and a deferred dispatch take effect.
            let subscription =
                SubscriptionStore::get_or_create(&self.pool, recipient.user_id).await?;

            for &channel in channels {
                if !should_send(
                    notification.kind,
                    notification.priority,
                    channel,
                    &subscription.preferences,
                    local_now,
                ) {
                    filtered += 1;
                    continue;
                }

                attempted += 1;
                let request = DeliveryRequest {
                    notification_id,
                    user_id: recipient.user_id,
                    username: recipient.username.clone(),
                    email: recipient.email.clone(),
                    title: notification.title.clone(),
                    content: notification.content.clone(),
                    kind: notification.kind,
                    priority: notification.priority,
                    silent: notification.settings.silent,
                };
                let sender = self.senders.get(channel);
                let timeout = self.send_timeout;
                let user_id = recipient.user_id;

                tasks.spawn(async move {
                    let result = match sender {
                        None => Err(format!("no sender configured for channel '{}'", channel)),
                        Some(sender) => {
                            match tokio::time::timeout(timeout, sender.send(&request)).await {
                                Ok(Ok(())) => Ok(()),
                                Ok(Err(e)) => Err(e.to_string()),
                                Err(_) => {
                                    Err(format!("send timed out after {}s", timeout.as_secs()))
                                }
                            }
                        }
                    };
                    DispatchOutcome {
                        user_id,
                        channel,
                        result,
                    }
                });
            }
        }

        // Settle-all join: every spawned send completes (or fails) before
        // the final status is computed.
        let mut outcomes = Vec::with_capacity(attempted);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(
                    notification_id = %notification_id,
                    error = %e,
                    "Dispatch task panicked"
                ),
            }
        }

        let summary = self
            .finalize(notification_id, &outcomes, attempted, filtered)
            .await?;

        tracing::info!(
            notification_id = %notification_id,
            attempted = summary.attempted,
            delivered = summary.delivered,
            failed = summary.failed,
            filtered = summary.filtered,
            status = %summary.status,
            "Dispatch finished"
        );

        Ok(summary)
    }

    /// Persist all channel outcomes, derive recipient statuses, set the
    /// final notification status and recompute statistics — one transaction.
    async fn finalize(
        &self,
        notification_id: Uuid,
        outcomes: &[DispatchOutcome],
        attempted: usize,
        filtered: usize,
    ) -> Result<DispatchSummary, AppError> {
        let mut delivered = 0usize;
        let mut failed = 0usize;

        let mut tx = self.pool.begin().await?;

        for outcome in outcomes {
            match &outcome.result {
                Ok(()) => {
                    delivered += 1;
                    sqlx::query(
                        r#"
                        UPDATE recipient_channels
                        SET status = 'delivered', sent_at = NOW(),
                            delivered_at = NOW(), error = NULL
                        WHERE notification_id = $1 AND user_id = $2 AND channel = $3
                        "#,
                    )
                    .bind(notification_id)
                    .bind(outcome.user_id)
                    .bind(outcome.channel)
                    .execute(&mut *tx)
                    .await?;
                }
                Err(error) => {
                    failed += 1;
                    tracing::warn!(
                        notification_id = %notification_id,
                        user_id = %outcome.user_id,
                        channel = %outcome.channel,
                        error = %error,
                        "Channel delivery failed"
                    );
                    sqlx::query(
                        r#"
                        UPDATE recipient_channels
                        SET status = 'failed', sent_at = NOW(), error = $4
                        WHERE notification_id = $1 AND user_id = $2 AND channel = $3
                        "#,
                    )
                    .bind(notification_id)
                    .bind(outcome.user_id)
                    .bind(outcome.channel)
                    .bind(error)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // Recipient status follows its channels: any delivery wins, else any
        // failure marks it failed, untouched recipients stay pending. Never
        // downgrades a recipient who already read the notification.
        sqlx::query(
            r#"
            UPDATE notification_recipients r
            SET delivery_status = CASE
                WHEN EXISTS (
                    SELECT 1 FROM recipient_channels c
                    WHERE c.notification_id = r.notification_id
                      AND c.user_id = r.user_id AND c.status = 'delivered'
                ) THEN 'delivered'
                WHEN EXISTS (
                    SELECT 1 FROM recipient_channels c
                    WHERE c.notification_id = r.notification_id
                      AND c.user_id = r.user_id AND c.status = 'failed'
                ) THEN 'failed'
                ELSE r.delivery_status
            END
            WHERE r.notification_id = $1 AND r.delivery_status <> 'read'
            "#,
        )
        .bind(notification_id)
        .execute(&mut *tx)
        .await?;

        // Any failed channel anywhere (including unretried earlier failures)
        // marks the whole notification failed.
        let (any_failed,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM recipient_channels
                WHERE notification_id = $1 AND status = 'failed'
            )
            "#,
        )
        .bind(notification_id)
        .fetch_one(&mut *tx)
        .await?;

        let final_status = if any_failed {
            NotificationStatus::Failed
        } else {
            NotificationStatus::Sent
        };

        sqlx::query("UPDATE notifications SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(notification_id)
            .bind(final_status)
            .execute(&mut *tx)
            .await?;

        stats::recompute(&mut *tx, notification_id).await?;

        tx.commit().await?;

        Ok(DispatchSummary {
            notification_id,
            attempted,
            delivered,
            failed,
            filtered,
            status: final_status,
        })
    }
}
