use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use pitchside_application::ScopeInstanceRepository;
use pitchside_core::{AppError, AppResult};
use pitchside_domain::{RoleScope, ScopeKey};

/// PostgreSQL-backed existence checks for scope-instance references.
#[derive(Clone)]
pub struct PostgresScopeInstanceRepository {
    pool: PgPool,
}

impl PostgresScopeInstanceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, query: &str, id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to check scope instance: {error}"))
            })
    }
}

#[async_trait]
impl ScopeInstanceRepository for PostgresScopeInstanceRepository {
    async fn scope_instance_exists(&self, scope: ScopeKey) -> AppResult<bool> {
        match (scope.scope(), scope.scope_id()) {
            (RoleScope::Global, _) => Ok(true),
            (RoleScope::Organization, Some(id)) => {
                self.exists("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)", id)
                    .await
            }
            (RoleScope::Event, Some(id)) => {
                self.exists("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)", id)
                    .await
            }
            // ScopeKey construction forbids non-global keys without an id.
            (_, None) => Ok(false),
        }
    }

    async fn organization_of_event(&self, event_id: Uuid) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT organization_id
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve event organization: {error}"))
        })
    }
}
