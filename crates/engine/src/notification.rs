//! Notification service — creation, queries, lifecycle updates and the
//! per-recipient read/acknowledge operations.
//!
//! The recipient set is resolved once at creation and frozen; read and
//! acknowledge updates touch single recipient rows so concurrent calls for
//! different users never clobber each other. Statistics are recomputed in
//! the same transaction as every recipient mutation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{
    ChannelFlags, DeliveryChannelState, Notification, NotificationSettings, NotificationStatus,
    NotificationType, Priority, Recipient, RecipientStatus, RecurringSchedule, Role, SenderType,
    SourceRef, TargetAudience,
};

use crate::audience::{AudienceResolver, Directory};
use crate::stats;
use crate::template::{TemplateProcessor, TemplateService};

/// The authenticated principal an operation runs as.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Actor {
    fn can_manage(&self, notification: &Notification) -> bool {
        self.role.is_admin() || notification.created_by == self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleParams {
    pub send_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub recurring: Option<RecurringSchedule>,
}

/// Parameters for creating a notification. Title/content/type may come from
/// a template instead of the request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationParams {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub target_audience: TargetAudience,
    pub channels: Option<ChannelFlags>,
    pub schedule: Option<ScheduleParams>,
    pub settings: Option<NotificationSettings>,
    pub template_id: Option<Uuid>,
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
    pub source: Option<SourceRef>,
    pub batch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationParams {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub channels: Option<ChannelFlags>,
    pub schedule: Option<ScheduleParams>,
    pub settings: Option<NotificationSettings>,
    pub status: Option<NotificationStatus>,
}

impl UpdateNotificationParams {
    /// Whether anything besides `status` is being changed.
    fn touches_content(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.kind.is_some()
            || self.priority.is_some()
            || self.category.is_some()
            || self.channels.is_some()
            || self.schedule.is_some()
            || self.settings.is_some()
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub status: Option<NotificationStatus>,
    pub sender_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboxQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Pagination envelope shared by the list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size as i64 - 1) / page_size as i64
        } else {
            0
        };
        Self {
            current: page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// A notification with its recipient rows and their channel states.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationDetail {
    #[serde(flatten)]
    pub notification: Notification,
    pub recipients: Vec<RecipientDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientDetail {
    #[serde(flatten)]
    pub recipient: Recipient,
    pub delivery_channels: Vec<DeliveryChannelState>,
}

/// A recipient's own view of a notification, for the inbox endpoints.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InboxItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub category: String,
    pub sender_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
    pub delivery_status: RecipientStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Delete,
    Cancel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchParams {
    pub action: BatchAction,
    pub notification_ids: Vec<Uuid>,
}

/// Service layer for notification storage and lifecycle.
pub struct NotificationService;

impl NotificationService {
    /// Create a notification: expand the template (if any), resolve the
    /// audience into frozen recipient rows, and persist everything in one
    /// transaction. Dispatch is a separate step driven by the caller.
    pub async fn create(
        pool: &PgPool,
        directory: &dyn Directory,
        params: &CreateNotificationParams,
        actor: &Actor,
    ) -> Result<Notification, AppError> {
        let rendered = match params.template_id {
            Some(template_id) => {
                let template = TemplateService::get(pool, template_id).await?;
                let empty = serde_json::Map::new();
                let bindings = params.variables.as_ref().unwrap_or(&empty);
                let rendered = TemplateProcessor::render(&template, bindings);
                Some((rendered, template))
            }
            None => None,
        };

        // Template output wins over request fields.
        let mut settings = params.settings.unwrap_or_default();
        let (title, content, kind, priority, channels, template_category) = match &rendered {
            Some((r, template)) => {
                settings.require_acknowledgment = r.require_acknowledgment;
                settings.auto_expire = r.auto_expire;
                (
                    Some(r.title.clone()),
                    Some(r.content.clone()),
                    Some(r.kind),
                    r.priority,
                    r.channels,
                    Some(template.category.clone()),
                )
            }
            None => (
                params.title.clone(),
                params.content.clone(),
                params.kind,
                params.priority.unwrap_or_default(),
                params.channels.unwrap_or_default(),
                None,
            ),
        };

        let title = title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Validation("title is required".to_string()))?;
        let content = content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("content is required".to_string()))?;
        let kind =
            kind.ok_or_else(|| AppError::Validation("type is required".to_string()))?;
        let category = params
            .category
            .clone()
            .or(template_category)
            .ok_or_else(|| AppError::Validation("category is required".to_string()))?;

        let schedule = params.schedule.clone().unwrap_or_default();
        let mut expires_at = schedule.expires_at;
        if expires_at.is_none()
            && settings.auto_expire
            && let Some((r, _)) = &rendered
            && let Some(hours) = r.expiry_hours
        {
            expires_at = Some(Utc::now() + chrono::Duration::hours(hours as i64));
        }

        let now = Utc::now();
        let status = match schedule.send_at {
            Some(send_at) if send_at > now => NotificationStatus::Scheduled,
            _ => NotificationStatus::Draft,
        };

        // Snapshot the audience. Later role/membership changes never touch
        // an existing notification's recipient list.
        let recipients = AudienceResolver::resolve(directory, &params.target_audience).await?;
        if recipients.is_empty() {
            tracing::warn!(
                created_by = %actor.id,
                "Notification created with zero resolved recipients"
            );
        }

        let sender_type = if actor.role.is_admin() {
            SenderType::Admin
        } else {
            SenderType::User
        };

        let id = Uuid::new_v4();
        let enabled_channels = channels.enabled();

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, title, content, kind, priority, category,
                 sender_id, sender_name, sender_type,
                 target_audience, channels, send_at, expires_at, recurring,
                 settings, status, created_by, template_id, batch_id, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(id)
        .bind(&title)
        .bind(&content)
        .bind(kind)
        .bind(priority)
        .bind(&category)
        .bind(actor.id)
        .bind(&actor.username)
        .bind(sender_type)
        .bind(Json(&params.target_audience))
        .bind(Json(channels))
        .bind(schedule.send_at)
        .bind(expires_at)
        .bind(schedule.recurring.as_ref().map(Json))
        .bind(Json(settings))
        .bind(status)
        .bind(actor.id)
        .bind(params.template_id)
        .bind(params.batch_id)
        .bind(params.source.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        for user in &recipients {
            sqlx::query(
                r#"
                INSERT INTO notification_recipients (notification_id, user_id, username, email)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .execute(&mut *tx)
            .await?;

            for &channel in &enabled_channels {
                sqlx::query(
                    r#"
                    INSERT INTO recipient_channels (notification_id, user_id, channel)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(id)
                .bind(user.id)
                .bind(channel)
                .execute(&mut *tx)
                .await?;
            }
        }

        stats::recompute(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(
            notification_id = %id,
            kind = %kind,
            status = %status,
            recipients = recipients.len(),
            "Notification created"
        );

        Self::get(pool, id).await
    }

    pub async fn get(pool: &PgPool, notification_id: Uuid) -> Result<Notification, AppError> {
        let notification = sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
            .bind(notification_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification {} not found", notification_id))
            })?;
        Ok(notification)
    }

    /// Full detail: the notification with every recipient and its channels.
    pub async fn get_detail(
        pool: &PgPool,
        notification_id: Uuid,
    ) -> Result<NotificationDetail, AppError> {
        let notification = Self::get(pool, notification_id).await?;

        let recipients: Vec<Recipient> = sqlx::query_as(
            "SELECT * FROM notification_recipients WHERE notification_id = $1 ORDER BY user_id",
        )
        .bind(notification_id)
        .fetch_all(pool)
        .await?;

        let channels: Vec<DeliveryChannelState> = sqlx::query_as(
            "SELECT * FROM recipient_channels WHERE notification_id = $1 ORDER BY user_id, channel",
        )
        .bind(notification_id)
        .fetch_all(pool)
        .await?;

        let recipients = recipients
            .into_iter()
            .map(|recipient| {
                let delivery_channels = channels
                    .iter()
                    .filter(|c| c.user_id == recipient.user_id)
                    .cloned()
                    .collect();
                RecipientDetail {
                    recipient,
                    delivery_channels,
                }
            })
            .collect();

        Ok(NotificationDetail {
            notification,
            recipients,
        })
    }

    pub async fn is_recipient(
        pool: &PgPool,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notification_recipients
                WHERE notification_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// List notifications scoped by role: students see only what they
    /// received, teachers what they sent or received, admins everything.
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        actor: &Actor,
    ) -> Result<(Vec<Notification>, Pagination), AppError> {
        let scope = actor.role.to_string();
        let kind = query.kind.map(|k| k.to_string());
        let priority = query.priority.map(|p| p.to_string());
        let status = query.status.map(|s| s.to_string());
        let page = query.page.max(1);
        let page_size = query.page_size.clamp(1, 100);
        let offset = (page - 1) as i64 * page_size as i64;

        let notifications: Vec<Notification> = sqlx::query_as(
            r#"
            SELECT n.*
            FROM notifications n
            WHERE CASE $1
                    WHEN 'student' THEN EXISTS (
                        SELECT 1 FROM notification_recipients r
                        WHERE r.notification_id = n.id AND r.user_id = $2)
                    WHEN 'teacher' THEN (n.created_by = $2 OR EXISTS (
                        SELECT 1 FROM notification_recipients r
                        WHERE r.notification_id = n.id AND r.user_id = $2))
                    ELSE TRUE
                  END
              AND ($3::text IS NULL OR n.kind = $3)
              AND ($4::text IS NULL OR n.priority = $4)
              AND ($5::text IS NULL OR n.status = $5)
              AND ($6::uuid IS NULL OR n.sender_id = $6)
              AND ($7::timestamptz IS NULL OR n.created_at >= $7)
              AND ($8::timestamptz IS NULL OR n.created_at <= $8)
            ORDER BY n.created_at DESC
            LIMIT $9 OFFSET $10
            "#,
        )
        .bind(&scope)
        .bind(actor.id)
        .bind(&kind)
        .bind(&priority)
        .bind(&status)
        .bind(query.sender_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications n
            WHERE CASE $1
                    WHEN 'student' THEN EXISTS (
                        SELECT 1 FROM notification_recipients r
                        WHERE r.notification_id = n.id AND r.user_id = $2)
                    WHEN 'teacher' THEN (n.created_by = $2 OR EXISTS (
                        SELECT 1 FROM notification_recipients r
                        WHERE r.notification_id = n.id AND r.user_id = $2))
                    ELSE TRUE
                  END
              AND ($3::text IS NULL OR n.kind = $3)
              AND ($4::text IS NULL OR n.priority = $4)
              AND ($5::text IS NULL OR n.status = $5)
              AND ($6::uuid IS NULL OR n.sender_id = $6)
              AND ($7::timestamptz IS NULL OR n.created_at >= $7)
              AND ($8::timestamptz IS NULL OR n.created_at <= $8)
            "#,
        )
        .bind(&scope)
        .bind(actor.id)
        .bind(&kind)
        .bind(&priority)
        .bind(&status)
        .bind(query.sender_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(pool)
        .await?;

        Ok((notifications, Pagination::new(page, page_size, total)))
    }

    /// Update a notification. Once sent (or mid-send) only the status field
    /// may change, and every status change is validated against the
    /// transition table.
    pub async fn update(
        pool: &PgPool,
        notification_id: Uuid,
        params: &UpdateNotificationParams,
        actor: &Actor,
    ) -> Result<Notification, AppError> {
        let existing = Self::get(pool, notification_id).await?;
        if !actor.can_manage(&existing) {
            return Err(AppError::Permission(
                "Not authorized to modify this notification".to_string(),
            ));
        }

        if matches!(
            existing.status,
            NotificationStatus::Sent | NotificationStatus::Sending
        ) && params.touches_content()
        {
            return Err(AppError::StateConflict(
                "Content of a sent notification cannot be modified".to_string(),
            ));
        }

        if let Some(to) = params.status
            && !existing.status.can_transition(to)
        {
            return Err(AppError::StateConflict(format!(
                "Illegal status transition '{}' -> '{}'",
                existing.status, to
            )));
        }

        let schedule = params.schedule.clone().unwrap_or_default();

        let notification: Notification = sqlx::query_as(
            r#"
            UPDATE notifications
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                kind = COALESCE($4, kind),
                priority = COALESCE($5, priority),
                category = COALESCE($6, category),
                channels = COALESCE($7, channels),
                send_at = COALESCE($8, send_at),
                expires_at = COALESCE($9, expires_at),
                recurring = COALESCE($10, recurring),
                settings = COALESCE($11, settings),
                status = COALESCE($12, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.kind)
        .bind(params.priority)
        .bind(&params.category)
        .bind(params.channels.map(Json))
        .bind(schedule.send_at)
        .bind(schedule.expires_at)
        .bind(schedule.recurring.as_ref().map(Json))
        .bind(params.settings.map(Json))
        .bind(params.status)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            notification_id = %notification_id,
            status = %notification.status,
            "Notification updated"
        );
        Ok(notification)
    }

    pub async fn delete(
        pool: &PgPool,
        notification_id: Uuid,
        actor: &Actor,
    ) -> Result<(), AppError> {
        let existing = Self::get(pool, notification_id).await?;
        if !actor.can_manage(&existing) {
            return Err(AppError::Permission(
                "Not authorized to delete this notification".to_string(),
            ));
        }

        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id)
            .execute(pool)
            .await?;

        tracing::info!(notification_id = %notification_id, "Notification deleted");
        Ok(())
    }

    /// A user's received notifications, newest first.
    pub async fn inbox(
        pool: &PgPool,
        user_id: Uuid,
        query: &InboxQuery,
    ) -> Result<(Vec<InboxItem>, Pagination), AppError> {
        let kind = query.kind.map(|k| k.to_string());
        let page = query.page.max(1);
        let page_size = query.page_size.clamp(1, 100);
        let offset = (page - 1) as i64 * page_size as i64;

        let items: Vec<InboxItem> = sqlx::query_as(
            r#"
            SELECT n.id, n.title, n.content, n.kind, n.priority, n.category,
                   n.sender_name, n.created_at,
                   r.read_at, r.acknowledged, r.delivery_status
            FROM notifications n
            JOIN notification_recipients r ON r.notification_id = n.id
            WHERE r.user_id = $1
              AND n.status IN ('sent', 'failed')
              AND ($2::text IS NULL OR n.kind = $2)
              AND (NOT $3 OR r.read_at IS NULL)
            ORDER BY n.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(&kind)
        .bind(query.unread_only)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications n
            JOIN notification_recipients r ON r.notification_id = n.id
            WHERE r.user_id = $1
              AND n.status IN ('sent', 'failed')
              AND ($2::text IS NULL OR n.kind = $2)
              AND (NOT $3 OR r.read_at IS NULL)
            "#,
        )
        .bind(user_id)
        .bind(&kind)
        .bind(query.unread_only)
        .fetch_one(pool)
        .await?;

        Ok((items, Pagination::new(page, page_size, total)))
    }

    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications n
            JOIN notification_recipients r ON r.notification_id = n.id
            WHERE r.user_id = $1
              AND r.read_at IS NULL
              AND n.status IN ('sent', 'failed')
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read for one user. Idempotent: a second call
    /// leaves the original `read_at` untouched.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE notification_recipients
            SET read_at = NOW(), delivery_status = 'read'
            WHERE notification_id = $1 AND user_id = $2 AND read_at IS NULL
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            if !Self::is_recipient(pool, notification_id, user_id).await? {
                return Err(AppError::NotFound(format!(
                    "Notification {} has no recipient entry for this user",
                    notification_id
                )));
            }
            // Already read — nothing to recompute
        } else {
            stats::recompute(&mut *tx, notification_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Record a recipient's acknowledgment. Idempotent like `mark_read`.
    pub async fn acknowledge(
        pool: &PgPool,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE notification_recipients
            SET acknowledged = TRUE, acknowledged_at = NOW()
            WHERE notification_id = $1 AND user_id = $2 AND acknowledged = FALSE
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            if !Self::is_recipient(pool, notification_id, user_id).await? {
                return Err(AppError::NotFound(format!(
                    "Notification {} has no recipient entry for this user",
                    notification_id
                )));
            }
        } else {
            stats::recompute(&mut *tx, notification_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Mark every unread notification read for one user. Returns the number
    /// of recipient rows updated.
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        let mut tx = pool.begin().await?;

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE notification_recipients
            SET read_at = NOW(), delivery_status = 'read'
            WHERE user_id = $1 AND read_at IS NULL
            RETURNING notification_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let touched: HashSet<Uuid> = rows.iter().map(|(id,)| *id).collect();
        for notification_id in &touched {
            stats::recompute(&mut *tx, *notification_id).await?;
        }

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    /// Bulk delete or cancel. Cancel only touches draft/scheduled rows.
    pub async fn batch(pool: &PgPool, params: &BatchParams) -> Result<u64, AppError> {
        if params.notification_ids.is_empty() {
            return Err(AppError::Validation(
                "notification_ids must not be empty".to_string(),
            ));
        }

        let affected = match params.action {
            BatchAction::Delete => {
                sqlx::query("DELETE FROM notifications WHERE id = ANY($1)")
                    .bind(&params.notification_ids)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
            BatchAction::Cancel => {
                sqlx::query(
                    r#"
                    UPDATE notifications
                    SET status = 'cancelled', updated_at = NOW()
                    WHERE id = ANY($1) AND status IN ('draft', 'scheduled')
                    "#,
                )
                .bind(&params.notification_ids)
                .execute(pool)
                .await?
                .rows_affected()
            }
        };

        tracing::info!(
            affected,
            requested = params.notification_ids.len(),
            "Batch operation completed"
        );
        Ok(affected)
    }
}
