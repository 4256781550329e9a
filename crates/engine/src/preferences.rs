//! Per-user subscription settings and the send-time preference filter.

use chrono::NaiveTime;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{
    Channel, NotificationType, Priority, Subscription, SubscriptionFilter,
    SubscriptionPreferences,
};

/// Storage for per-user subscription settings, created lazily with defaults.
pub struct SubscriptionStore;

impl SubscriptionStore {
    /// Fetch a user's subscription, creating the default one on first
    /// access. Insert-then-select with `ON CONFLICT DO NOTHING` so
    /// concurrent first accesses by the same user cannot race.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Subscription, AppError> {
        sqlx::query(
            r#"
            INSERT INTO notification_subscriptions (user_id, preferences, filters)
            VALUES ($1, $2, '[]')
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Json(SubscriptionPreferences::default()))
        .execute(pool)
        .await?;

        let subscription =
            sqlx::query_as("SELECT * FROM notification_subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(subscription)
    }

    /// Replace a user's preferences and filters, creating the row if needed.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        preferences: &SubscriptionPreferences,
        filters: &[SubscriptionFilter],
    ) -> Result<Subscription, AppError> {
        let subscription: Subscription = sqlx::query_as(
            r#"
            INSERT INTO notification_subscriptions (user_id, preferences, filters)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET preferences = EXCLUDED.preferences,
                filters = EXCLUDED.filters,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Json(preferences))
        .bind(Json(filters))
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user_id, "Subscription preferences updated");
        Ok(subscription)
    }
}

/// Decide whether a notification may go out to one channel for one user.
///
/// Evaluated at send time, not creation time, so preference changes between
/// creation and a deferred dispatch take effect. Rules, in order:
/// 1. the channel must be enabled in the user's preferences;
/// 2. a non-empty per-channel type allow-list must contain the
///    notification's type;
/// 3. SMS marked urgent-only passes urgent-priority notifications only;
/// 4. web delivery is suppressed during quiet hours (`[start, end)`,
///    minute-resolution "HH:MM" comparison, no overnight wrap).
///
/// `now` is the user's current local wall-clock time.
pub fn should_send(
    kind: NotificationType,
    priority: Priority,
    channel: Channel,
    prefs: &SubscriptionPreferences,
    now: NaiveTime,
) -> bool {
    let (enabled, types) = match channel {
        Channel::Web => (prefs.web.enabled, &prefs.web.types),
        Channel::Email => (prefs.email.enabled, &prefs.email.types),
        Channel::Sms => (prefs.sms.enabled, &prefs.sms.types),
        Channel::Push => (prefs.push.enabled, &prefs.push.types),
    };

    if !enabled {
        return false;
    }

    if !types.is_empty() && !types.contains(&kind) {
        return false;
    }

    if channel == Channel::Sms && prefs.sms.urgent_only {
        return priority == Priority::Urgent;
    }

    if channel == Channel::Web
        && prefs.web.quiet.enabled
        && let (Some(start), Some(end)) = (
            prefs.web.quiet.start_time.as_deref(),
            prefs.web.quiet.end_time.as_deref(),
        )
    {
        let current = now.format("%H:%M").to_string();
        if current.as_str() >= start && current.as_str() < end {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use sportiq_common::types::QuietHours;

    fn prefs() -> SubscriptionPreferences {
        SubscriptionPreferences::default()
    }

    fn at(hhmm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
    }

    #[test]
    fn test_disabled_channel_never_sends() {
        let mut p = prefs();
        p.sms.enabled = false;
        // Even urgent notifications stay out of a disabled channel
        assert!(!should_send(
            NotificationType::Warning,
            Priority::Urgent,
            Channel::Sms,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_type_allow_list_filters() {
        let mut p = prefs();
        p.web.types = vec![NotificationType::Exam, NotificationType::Grade];

        assert!(should_send(
            NotificationType::Exam,
            Priority::Medium,
            Channel::Web,
            &p,
            at("12:00")
        ));
        assert!(!should_send(
            NotificationType::Announcement,
            Priority::Medium,
            Channel::Web,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_empty_allow_list_allows_all_types() {
        let p = prefs();
        assert!(should_send(
            NotificationType::Achievement,
            Priority::Low,
            Channel::Push,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_sms_urgent_only() {
        let mut p = prefs();
        p.sms.enabled = true;
        p.sms.urgent_only = true;

        assert!(should_send(
            NotificationType::Warning,
            Priority::Urgent,
            Channel::Sms,
            &p,
            at("12:00")
        ));
        assert!(!should_send(
            NotificationType::Warning,
            Priority::High,
            Channel::Sms,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_sms_without_urgent_only_passes_any_priority() {
        let mut p = prefs();
        p.sms.enabled = true;
        p.sms.urgent_only = false;

        assert!(should_send(
            NotificationType::Reminder,
            Priority::Low,
            Channel::Sms,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_quiet_hours_window_edges() {
        let mut p = prefs();
        p.web.quiet = QuietHours {
            enabled: true,
            start_time: Some("22:00".to_string()),
            end_time: Some("23:30".to_string()),
        };

        // Inclusive start, exclusive end
        assert!(!should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("22:00")
        ));
        assert!(!should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("23:29")
        ));
        assert!(should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("23:30")
        ));
        assert!(should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("21:59")
        ));
    }

    #[test]
    fn test_quiet_hours_disabled_or_incomplete_window_is_ignored() {
        let mut p = prefs();
        p.web.quiet = QuietHours {
            enabled: true,
            start_time: Some("00:00".to_string()),
            end_time: None,
        };
        assert!(should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("12:00")
        ));

        p.web.quiet.enabled = false;
        p.web.quiet.end_time = Some("23:59".to_string());
        assert!(should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Web,
            &p,
            at("12:00")
        ));
    }

    #[test]
    fn test_quiet_hours_only_apply_to_web() {
        let mut p = prefs();
        p.web.quiet = QuietHours {
            enabled: true,
            start_time: Some("00:00".to_string()),
            end_time: Some("23:59".to_string()),
        };
        assert!(should_send(
            NotificationType::System,
            Priority::Medium,
            Channel::Push,
            &p,
            at("12:00")
        ));
    }
}
