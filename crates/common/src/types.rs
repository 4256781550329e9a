use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Notification categories exposed across the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    System,
    Assignment,
    Exam,
    Grade,
    Announcement,
    Achievement,
    Reminder,
    Warning,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::System => write!(f, "system"),
            NotificationType::Assignment => write!(f, "assignment"),
            NotificationType::Exam => write!(f, "exam"),
            NotificationType::Grade => write!(f, "grade"),
            NotificationType::Announcement => write!(f, "announcement"),
            NotificationType::Achievement => write!(f, "achievement"),
            NotificationType::Reminder => write!(f, "reminder"),
            NotificationType::Warning => write!(f, "warning"),
        }
    }
}

/// Notification priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Delivery transport for a single recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Web,
    Email,
    Sms,
    Push,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Web => write!(f, "web"),
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
            Channel::Push => write!(f, "push"),
        }
    }
}

/// Notification lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
    Cancelled,
    Expired,
}

impl NotificationStatus {
    /// Whether a transition from `self` to `to` is legal.
    ///
    /// Edges: draft/scheduled may be rescheduled, dispatched or cancelled;
    /// sending resolves to sent or failed; failed may be re-dispatched;
    /// the retention sweep expires sent notifications. Cancelled and
    /// expired are terminal.
    pub fn can_transition(self, to: NotificationStatus) -> bool {
        use NotificationStatus::*;
        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Draft, Scheduled)
                | (Scheduled, Draft)
                | (Draft, Sending)
                | (Scheduled, Sending)
                | (Draft, Cancelled)
                | (Scheduled, Cancelled)
                | (Sending, Sent)
                | (Sending, Failed)
                | (Sent, Expired)
                | (Failed, Sending)
        )
    }

    /// Statuses from which a dispatch may start (`failed` is the explicit retry).
    pub fn is_dispatchable(self) -> bool {
        matches!(
            self,
            NotificationStatus::Draft | NotificationStatus::Scheduled | NotificationStatus::Failed
        )
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Draft => write!(f, "draft"),
            NotificationStatus::Scheduled => write!(f, "scheduled"),
            NotificationStatus::Sending => write!(f, "sending"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
            NotificationStatus::Cancelled => write!(f, "cancelled"),
            NotificationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Per-recipient delivery state, aggregated over the recipient's channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Read,
}

impl std::fmt::Display for RecipientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientStatus::Pending => write!(f, "pending"),
            RecipientStatus::Sent => write!(f, "sent"),
            RecipientStatus::Delivered => write!(f, "delivered"),
            RecipientStatus::Failed => write!(f, "failed"),
            RecipientStatus::Read => write!(f, "read"),
        }
    }
}

/// Per-channel delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelStatus::Pending => write!(f, "pending"),
            ChannelStatus::Sent => write!(f, "sent"),
            ChannelStatus::Delivered => write!(f, "delivered"),
            ChannelStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Platform roles used for API authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Teacher => write!(f, "teacher"),
            Role::Admin => write!(f, "admin"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// Who a notification was sent on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    System,
    User,
    Admin,
}

/// Who a notification is addressed to, resolved once at creation time.
///
/// Each variant carries its own criteria payload. Unknown variants are
/// rejected when the audience is decoded, before any recipient rows exist.
/// `custom` passes its conditions straight to the directory query and must
/// only be accepted from privileged callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "criteria", rename_all = "lowercase")]
pub enum TargetAudience {
    All,
    Role { roles: Vec<Role> },
    Institution { institution_ids: Vec<Uuid> },
    Class { class_ids: Vec<Uuid> },
    User { user_ids: Vec<Uuid> },
    Custom { conditions: serde_json::Value },
}

/// Notification-level channel enable flags. A channel fires only when it is
/// enabled here AND accepted by the recipient's subscription preferences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelFlags {
    pub web: bool,
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl Default for ChannelFlags {
    fn default() -> Self {
        Self {
            web: true,
            email: false,
            sms: false,
            push: false,
        }
    }
}

impl ChannelFlags {
    /// The channels enabled by these flags, in fixed web/email/sms/push order.
    pub fn enabled(&self) -> Vec<Channel> {
        let mut channels = Vec::new();
        if self.web {
            channels.push(Channel::Web);
        }
        if self.email {
            channels.push(Channel::Email);
        }
        if self.sms {
            channels.push(Channel::Sms);
        }
        if self.push {
            channels.push(Channel::Push);
        }
        channels
    }
}

/// Policy flags consumed by the orchestrator and the read/ack endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub require_acknowledgment: bool,
    pub allow_reply: bool,
    pub track_opening: bool,
    pub auto_expire: bool,
    pub silent: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            require_acknowledgment: false,
            allow_reply: false,
            track_opening: true,
            auto_expire: false,
            silent: false,
        }
    }
}

/// Recurrence pattern for scheduled notifications. Declared in the model;
/// the dispatcher only handles single-shot `send_at` and does not expand
/// recurring schedules into new instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub enabled: bool,
    pub pattern: Option<RecurrencePattern>,
    pub interval: Option<u32>,
    pub end_date: Option<DateTime<Utc>>,
    pub days_of_week: Option<Vec<u8>>,
    pub month_day: Option<u8>,
}

/// Origin of a system-generated notification (module/action/resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub module: String,
    pub action: String,
    pub resource_id: Option<String>,
}

/// Derived delivery statistics. Always a pure function of the recipient
/// rows; recomputed inside the same transaction as any recipient mutation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationStatistics {
    pub total_recipients: i64,
    pub sent_count: i64,
    pub delivered_count: i64,
    pub read_count: i64,
    pub acknowledged_count: i64,
    pub failed_count: i64,
    pub open_rate: f64,
    pub response_rate: f64,
}

/// The unit of dispatch.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub category: String,
    pub sender_id: Option<Uuid>,
    pub sender_name: Option<String>,
    pub sender_type: SenderType,
    pub target_audience: Json<TargetAudience>,
    pub channels: Json<ChannelFlags>,
    pub send_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub recurring: Option<Json<RecurringSchedule>>,
    pub settings: Json<NotificationSettings>,
    pub status: NotificationStatus,
    #[sqlx(flatten)]
    pub statistics: NotificationStatistics,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub template_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub source: Option<Json<SourceRef>>,
}

/// A per-user delivery record, frozen into the notification at creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Recipient {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub delivery_status: RecipientStatus,
}

/// One transport's delivery state for a single recipient.
/// `error` is populated iff `status` is failed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeliveryChannelState {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub channel: Channel,
    pub status: ChannelStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// A user identity as returned by the directory, snapshotted into
/// recipient rows at audience resolution time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}

/// Declared template variable with an optional default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Date,
    Boolean,
    Object,
}

/// Per-channel enable flag and optional content override on a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateChannel {
    pub enabled: bool,
    pub subject: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateChannels {
    pub web: TemplateChannel,
    pub email: TemplateChannel,
    pub sms: TemplateChannel,
    pub push: TemplateChannel,
}

impl Default for TemplateChannels {
    fn default() -> Self {
        Self {
            web: TemplateChannel {
                enabled: true,
                ..TemplateChannel::default()
            },
            email: TemplateChannel::default(),
            sms: TemplateChannel::default(),
            push: TemplateChannel::default(),
        }
    }
}

/// Default settings a template applies to notifications created from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub require_acknowledgment: bool,
    pub priority: Priority,
    pub auto_expire: bool,
    pub expiry_hours: Option<u32>,
}

/// A stored notification template with `{{variable}}` placeholders.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub content: String,
    pub variables: Json<Vec<TemplateVariable>>,
    pub channels: Json<TemplateChannels>,
    pub settings: Json<TemplateSettings>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Web channel quiet-hours window, minute-resolution "HH:MM" strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebPreferences {
    pub enabled: bool,
    pub types: Vec<NotificationType>,
    pub quiet: QuietHours,
}

impl Default for WebPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            types: Vec::new(),
            quiet: QuietHours::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    Immediate,
    Daily,
    Weekly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailPreferences {
    pub enabled: bool,
    pub types: Vec<NotificationType>,
    pub frequency: EmailFrequency,
    pub digest: bool,
    pub digest_time: Option<String>,
}

impl Default for EmailPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            types: Vec::new(),
            frequency: EmailFrequency::Immediate,
            digest: false,
            digest_time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsPreferences {
    pub enabled: bool,
    pub types: Vec<NotificationType>,
    /// When set, only urgent-priority notifications go out over SMS.
    pub urgent_only: bool,
}

impl Default for SmsPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            types: Vec::new(),
            urgent_only: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushPreferences {
    pub enabled: bool,
    pub types: Vec<NotificationType>,
    pub sound: bool,
    pub vibration: bool,
}

impl Default for PushPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            types: Vec::new(),
            sound: true,
            vibration: true,
        }
    }
}

/// Per-user channel subscription settings. The `Default` impl is the
/// hard-coded subscription created lazily on first access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionPreferences {
    pub web: WebPreferences,
    pub email: EmailPreferences,
    pub sms: SmsPreferences,
    pub push: PushPreferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    Allow,
    Block,
}

/// Custom override filter. Persisted and returned by the preferences API
/// but not evaluated by the dispatch filter (extension point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    #[serde(rename = "type")]
    pub kind: String,
    pub criteria: serde_json::Value,
    pub action: FilterAction,
}

/// One subscription row per user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub user_id: Uuid,
    pub preferences: Json<SubscriptionPreferences>,
    pub filters: Json<Vec<SubscriptionFilter>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_statuses() {
        assert!(NotificationStatus::Draft.is_dispatchable());
        assert!(NotificationStatus::Scheduled.is_dispatchable());
        assert!(NotificationStatus::Failed.is_dispatchable());
        assert!(!NotificationStatus::Sent.is_dispatchable());
        assert!(!NotificationStatus::Sending.is_dispatchable());
        assert!(!NotificationStatus::Cancelled.is_dispatchable());
        assert!(!NotificationStatus::Expired.is_dispatchable());
    }

    #[test]
    fn test_transition_table() {
        use NotificationStatus::*;
        assert!(Draft.can_transition(Sending));
        assert!(Scheduled.can_transition(Sending));
        assert!(Draft.can_transition(Cancelled));
        assert!(Scheduled.can_transition(Cancelled));
        assert!(Sending.can_transition(Sent));
        assert!(Sending.can_transition(Failed));
        assert!(Sent.can_transition(Expired));
        assert!(Failed.can_transition(Sending));

        // Post-send cancellation is not a legal correction
        assert!(!Sent.can_transition(Cancelled));
        assert!(!Sending.can_transition(Cancelled));
        // Terminal states stay terminal
        assert!(!Cancelled.can_transition(Sending));
        assert!(!Expired.can_transition(Draft));
        assert!(!Sent.can_transition(Sending));
    }

    #[test]
    fn test_same_status_is_noop_transition() {
        use NotificationStatus::*;
        assert!(Sent.can_transition(Sent));
        assert!(Draft.can_transition(Draft));
    }

    #[test]
    fn test_target_audience_decode_role() {
        let audience: TargetAudience = serde_json::from_value(serde_json::json!({
            "type": "role",
            "criteria": { "roles": ["teacher", "admin"] }
        }))
        .unwrap();
        match audience {
            TargetAudience::Role { roles } => {
                assert_eq!(roles, vec![Role::Teacher, Role::Admin]);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_target_audience_decode_all_without_criteria() {
        let audience: TargetAudience =
            serde_json::from_value(serde_json::json!({ "type": "all" })).unwrap();
        assert!(matches!(audience, TargetAudience::All));
    }

    #[test]
    fn test_target_audience_rejects_unknown_variant() {
        let result: Result<TargetAudience, _> = serde_json::from_value(serde_json::json!({
            "type": "geofence",
            "criteria": { "radius_km": 5 }
        }));
        assert!(result.is_err(), "Unknown audience type must be rejected");
    }

    #[test]
    fn test_default_subscription_preferences() {
        let prefs = SubscriptionPreferences::default();
        assert!(prefs.web.enabled);
        assert!(prefs.push.enabled);
        assert!(prefs.email.enabled);
        assert_eq!(prefs.email.frequency, EmailFrequency::Immediate);
        assert!(!prefs.sms.enabled);
        assert!(prefs.sms.urgent_only);
    }

    #[test]
    fn test_channel_flags_enabled_order() {
        let flags = ChannelFlags {
            web: true,
            email: false,
            sms: true,
            push: true,
        };
        assert_eq!(
            flags.enabled(),
            vec![Channel::Web, Channel::Sms, Channel::Push]
        );
    }
}
