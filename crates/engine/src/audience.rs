//! Audience resolution — turns a target audience into a concrete,
//! deduplicated recipient set.
//!
//! Resolution is a snapshot: the resolved users are frozen into recipient
//! rows at creation time, and later role or membership changes never
//! retroactively affect an existing notification.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use sportiq_common::error::AppError;
use sportiq_common::types::{DirectoryUser, Role, TargetAudience};

/// User directory lookups needed for audience resolution.
///
/// The directory is owned by the platform's user service; this trait is the
/// engine's only view of it. Every method returns active users only.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn active_users(&self) -> Result<Vec<DirectoryUser>, AppError>;
    async fn users_by_role(&self, roles: &[Role]) -> Result<Vec<DirectoryUser>, AppError>;
    async fn users_by_institution(
        &self,
        institution_ids: &[Uuid],
    ) -> Result<Vec<DirectoryUser>, AppError>;
    async fn users_by_class(&self, class_ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError>;
    async fn users_by_id(&self, user_ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError>;
    /// Arbitrary attribute criteria, passed through unvalidated. Privileged
    /// callers only.
    async fn users_by_criteria(
        &self,
        conditions: &serde_json::Value,
    ) -> Result<Vec<DirectoryUser>, AppError>;
}

/// Directory backed by the platform's `users` / `class_members` tables.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn active_users(&self) -> Result<Vec<DirectoryUser>, AppError> {
        let users = sqlx::query_as(
            "SELECT id, username, email FROM users WHERE status = 'active' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn users_by_role(&self, roles: &[Role]) -> Result<Vec<DirectoryUser>, AppError> {
        let role_names: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        let users = sqlx::query_as(
            r#"
            SELECT id, username, email
            FROM users
            WHERE role = ANY($1) AND status = 'active'
            ORDER BY id
            "#,
        )
        .bind(&role_names)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn users_by_institution(
        &self,
        institution_ids: &[Uuid],
    ) -> Result<Vec<DirectoryUser>, AppError> {
        let users = sqlx::query_as(
            r#"
            SELECT id, username, email
            FROM users
            WHERE institution_id = ANY($1) AND status = 'active'
            ORDER BY id
            "#,
        )
        .bind(institution_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn users_by_class(&self, class_ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError> {
        // Rosters are flattened across all listed classes
        let users = sqlx::query_as(
            r#"
            SELECT DISTINCT u.id, u.username, u.email
            FROM users u
            JOIN class_members cm ON cm.user_id = u.id
            WHERE cm.class_id = ANY($1) AND u.status = 'active'
            ORDER BY u.id
            "#,
        )
        .bind(class_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn users_by_id(&self, user_ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError> {
        let users = sqlx::query_as(
            r#"
            SELECT id, username, email
            FROM users
            WHERE id = ANY($1) AND status = 'active'
            ORDER BY id
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn users_by_criteria(
        &self,
        conditions: &serde_json::Value,
    ) -> Result<Vec<DirectoryUser>, AppError> {
        let users = sqlx::query_as(
            r#"
            SELECT id, username, email
            FROM users
            WHERE attributes @> $1 AND status = 'active'
            ORDER BY id
            "#,
        )
        .bind(Json(conditions.clone()))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

/// Resolves a target audience against a directory.
pub struct AudienceResolver;

impl AudienceResolver {
    /// Resolve the audience into a deduplicated user list, first occurrence
    /// wins. An empty result is valid — callers decide what a notification
    /// with zero recipients means.
    pub async fn resolve(
        directory: &dyn Directory,
        audience: &TargetAudience,
    ) -> Result<Vec<DirectoryUser>, AppError> {
        let users = match audience {
            TargetAudience::All => directory.active_users().await?,
            TargetAudience::Role { roles } => directory.users_by_role(roles).await?,
            TargetAudience::Institution { institution_ids } => {
                directory.users_by_institution(institution_ids).await?
            }
            TargetAudience::Class { class_ids } => directory.users_by_class(class_ids).await?,
            TargetAudience::User { user_ids } => directory.users_by_id(user_ids).await?,
            TargetAudience::Custom { conditions } => {
                directory.users_by_criteria(conditions).await?
            }
        };

        let mut seen = HashSet::new();
        Ok(users.into_iter().filter(|u| seen.insert(u.id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Directory stub that returns a fixed list for every query.
    struct FixedDirectory {
        users: Vec<DirectoryUser>,
    }

    #[async_trait]
    impl Directory for FixedDirectory {
        async fn active_users(&self) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
        async fn users_by_role(&self, _roles: &[Role]) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
        async fn users_by_institution(
            &self,
            _ids: &[Uuid],
        ) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
        async fn users_by_class(&self, _ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
        async fn users_by_id(&self, _ids: &[Uuid]) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
        async fn users_by_criteria(
            &self,
            _conditions: &serde_json::Value,
        ) -> Result<Vec<DirectoryUser>, AppError> {
            Ok(self.users.clone())
        }
    }

    fn user(id: Uuid, name: &str) -> DirectoryUser {
        DirectoryUser {
            id,
            username: name.to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_deduplicates_preserving_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let directory = FixedDirectory {
            users: vec![user(a, "amy"), user(b, "bo"), user(a, "amy")],
        };

        let resolved = AudienceResolver::resolve(&directory, &TargetAudience::All)
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].id, a);
        assert_eq!(resolved[1].id, b);
    }

    #[tokio::test]
    async fn test_resolve_empty_audience_is_allowed() {
        let directory = FixedDirectory { users: vec![] };
        let resolved = AudienceResolver::resolve(
            &directory,
            &TargetAudience::User { user_ids: vec![] },
        )
        .await
        .unwrap();
        assert!(resolved.is_empty());
    }
}
