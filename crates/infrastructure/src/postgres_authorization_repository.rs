use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use pitchside_application::AuthorizationRepository;
use pitchside_core::{AppError, AppResult, UserId};
use pitchside_domain::{Permission, ScopeKey};

/// PostgreSQL-backed repository answering effective-permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_user(
        &self,
        user_id: UserId,
        scope: ScopeKey,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT grants.permission
            FROM rbac_role_assignments AS assignments
            INNER JOIN rbac_role_grants AS grants
                ON grants.role_id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.scope = $2
                AND assignments.scope_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(scope.scope().as_str())
        .bind(scope.scope_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|value| {
                Permission::from_str(value.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{value}' for user '{user_id}': {error}"
                    ))
                })
            })
            .collect()
    }
}
