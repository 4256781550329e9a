//! Notification templates — storage access and `{{variable}}` expansion.

use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{
    ChannelFlags, NotificationTemplate, NotificationType, Priority, TemplateChannels,
    TemplateSettings, TemplateVariable,
};

/// A template expanded against concrete variable bindings, ready to be
/// merged into the notification being created.
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub title: String,
    pub content: String,
    pub kind: NotificationType,
    pub priority: Priority,
    pub channels: ChannelFlags,
    pub require_acknowledgment: bool,
    pub auto_expire: bool,
    pub expiry_hours: Option<u32>,
}

pub struct TemplateProcessor;

impl TemplateProcessor {
    /// Expand every declared variable in title and content.
    ///
    /// Substitution order per variable: binding, then declared default, then
    /// the empty string. A missing required variable degrades to the empty
    /// string rather than failing — the template author sees a warning in
    /// the logs, the recipient sees a blank. Substitution is textual; bound
    /// values are not checked against the variable's declared type.
    pub fn render(
        template: &NotificationTemplate,
        bindings: &serde_json::Map<String, Value>,
    ) -> RenderedTemplate {
        let mut title = template.title.clone();
        let mut content = template.content.clone();

        for variable in template.variables.iter() {
            let value = bindings
                .get(&variable.name)
                .cloned()
                .or_else(|| variable.default_value.clone());

            if value.is_none() && variable.required {
                tracing::warn!(
                    template = %template.name,
                    variable = %variable.name,
                    "Required template variable missing, substituting empty string"
                );
            }

            let text = value.as_ref().map(render_value).unwrap_or_default();
            let placeholder = format!("{{{{{}}}}}", variable.name);
            title = title.replace(&placeholder, &text);
            content = content.replace(&placeholder, &text);
        }

        RenderedTemplate {
            title,
            content,
            kind: template.kind,
            priority: template.settings.priority,
            channels: ChannelFlags {
                web: template.channels.web.enabled,
                email: template.channels.email.enabled,
                sms: template.channels.sms.enabled,
                push: template.channels.push.enabled,
            },
            require_acknowledgment: template.settings.require_acknowledgment,
            auto_expire: template.settings.auto_expire,
            expiry_hours: template.settings.expiry_hours,
        }
    }
}

/// Plain-text rendering for substitution: strings unquoted, scalars via
/// Display, null empty, composites as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parameters for creating a new template.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateTemplateParams {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub channels: TemplateChannels,
    #[serde(default)]
    pub settings: TemplateSettings,
}

/// Optional filters for listing templates.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TemplateListQuery {
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Service layer for template storage.
pub struct TemplateService;

impl TemplateService {
    pub async fn create(
        pool: &PgPool,
        params: &CreateTemplateParams,
        created_by: Uuid,
    ) -> Result<NotificationTemplate, AppError> {
        let id = Uuid::new_v4();
        let template: NotificationTemplate = sqlx::query_as(
            r#"
            INSERT INTO notification_templates
                (id, name, description, category, kind, title, content,
                 variables, channels, settings, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(&params.description)
        .bind(&params.category)
        .bind(params.kind)
        .bind(&params.title)
        .bind(&params.content)
        .bind(Json(&params.variables))
        .bind(Json(&params.channels))
        .bind(Json(&params.settings))
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        tracing::info!(template_id = %template.id, name = %template.name, "Template created");
        Ok(template)
    }

    pub async fn get(pool: &PgPool, template_id: Uuid) -> Result<NotificationTemplate, AppError> {
        let template = sqlx::query_as("SELECT * FROM notification_templates WHERE id = $1")
            .bind(template_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;
        Ok(template)
    }

    pub async fn list(
        pool: &PgPool,
        query: &TemplateListQuery,
    ) -> Result<Vec<NotificationTemplate>, AppError> {
        let templates = sqlx::query_as(
            r#"
            SELECT *
            FROM notification_templates
            WHERE ($1::text IS NULL OR kind = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::boolean IS NULL OR is_active = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.kind.map(|k| k.to_string()))
        .bind(&query.category)
        .bind(query.is_active)
        .fetch_all(pool)
        .await?;
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sportiq_common::types::{TemplateChannel, VariableType};

    fn make_template(
        title: &str,
        content: &str,
        variables: Vec<TemplateVariable>,
    ) -> NotificationTemplate {
        NotificationTemplate {
            id: Uuid::new_v4(),
            name: "exam-reminder".to_string(),
            description: None,
            category: "exams".to_string(),
            kind: NotificationType::Exam,
            title: title.to_string(),
            content: content.to_string(),
            variables: Json(variables),
            channels: Json(TemplateChannels {
                web: TemplateChannel {
                    enabled: true,
                    ..Default::default()
                },
                email: TemplateChannel {
                    enabled: true,
                    ..Default::default()
                },
                sms: TemplateChannel::default(),
                push: TemplateChannel::default(),
            }),
            settings: Json(TemplateSettings {
                require_acknowledgment: true,
                priority: Priority::High,
                auto_expire: true,
                expiry_hours: Some(48),
            }),
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variable(name: &str, required: bool, default_value: Option<Value>) -> TemplateVariable {
        TemplateVariable {
            name: name.to_string(),
            kind: VariableType::String,
            required,
            default_value,
            description: None,
        }
    }

    #[test]
    fn test_render_substitutes_bindings() {
        let template = make_template(
            "{{exam}} starts soon",
            "Hi {{student}}, {{exam}} starts at {{time}}.",
            vec![
                variable("exam", true, None),
                variable("student", true, None),
                variable("time", false, None),
            ],
        );

        let mut bindings = serde_json::Map::new();
        bindings.insert("exam".into(), Value::String("Basketball Rules 101".into()));
        bindings.insert("student".into(), Value::String("Lin".into()));
        bindings.insert("time".into(), Value::String("09:00".into()));

        let rendered = TemplateProcessor::render(&template, &bindings);
        assert_eq!(rendered.title, "Basketball Rules 101 starts soon");
        assert_eq!(
            rendered.content,
            "Hi Lin, Basketball Rules 101 starts at 09:00."
        );
        assert_eq!(rendered.kind, NotificationType::Exam);
        assert_eq!(rendered.priority, Priority::High);
        assert!(rendered.channels.email);
        assert!(!rendered.channels.sms);
        assert!(rendered.require_acknowledgment);
        assert_eq!(rendered.expiry_hours, Some(48));
    }

    #[test]
    fn test_render_falls_back_to_default_value() {
        let template = make_template(
            "Reminder: {{exam}}",
            "{{exam}} at {{venue}}",
            vec![
                variable("exam", true, None),
                variable("venue", false, Some(Value::String("main gym".into()))),
            ],
        );

        let mut bindings = serde_json::Map::new();
        bindings.insert("exam".into(), Value::String("Swimming theory".into()));

        let rendered = TemplateProcessor::render(&template, &bindings);
        assert_eq!(rendered.content, "Swimming theory at main gym");
    }

    #[test]
    fn test_render_missing_required_degrades_to_empty() {
        let template = make_template(
            "{{exam}} reminder",
            "Don't forget {{exam}}",
            vec![variable("exam", true, None)],
        );

        let rendered = TemplateProcessor::render(&template, &serde_json::Map::new());
        assert_eq!(rendered.title, " reminder");
        assert_eq!(rendered.content, "Don't forget ");
    }

    #[test]
    fn test_render_replaces_every_occurrence_and_non_strings() {
        let template = make_template(
            "{{n}} new items",
            "{{n}} + {{n}} ready: {{ready}}",
            vec![
                variable("n", false, None),
                variable("ready", false, None),
            ],
        );

        let mut bindings = serde_json::Map::new();
        bindings.insert("n".into(), Value::Number(3.into()));
        bindings.insert("ready".into(), Value::Bool(true));

        let rendered = TemplateProcessor::render(&template, &bindings);
        assert_eq!(rendered.title, "3 new items");
        assert_eq!(rendered.content, "3 + 3 ready: true");
    }

    #[test]
    fn test_render_leaves_undeclared_placeholders_alone() {
        let template = make_template(
            "{{declared}} and {{undeclared}}",
            "",
            vec![variable("declared", false, Some(Value::String("yes".into())))],
        );

        let rendered = TemplateProcessor::render(&template, &serde_json::Map::new());
        assert_eq!(rendered.title, "yes and {{undeclared}}");
    }
}
