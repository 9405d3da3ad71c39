use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{PermissionCatalogRepository, PermissionRecord};
use pitchside_core::{AppError, AppResult};
use pitchside_domain::{Permission, RoleScope};

/// PostgreSQL-backed read-only view of the seeded permission catalog.
#[derive(Clone)]
pub struct PostgresPermissionCatalogRepository {
    pool: PgPool,
}

impl PostgresPermissionCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CatalogRow {
    name: String,
    description: Option<String>,
}

fn into_record(row: CatalogRow) -> AppResult<PermissionRecord> {
    let permission = Permission::from_str(row.name.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "invalid seeded permission '{}': {error}",
            row.name
        ))
    })?;

    Ok(PermissionRecord {
        permission,
        description: row.description,
    })
}

#[async_trait]
impl PermissionCatalogRepository for PostgresPermissionCatalogRepository {
    async fn list_all(&self) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT name, description
            FROM rbac_permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(into_record).collect()
    }

    async fn list_by_scope(&self, scope: RoleScope) -> AppResult<Vec<PermissionRecord>> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT name, description
            FROM rbac_permissions
            WHERE scope = $1
            ORDER BY name
            "#,
        )
        .bind(scope.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(into_record).collect()
    }
}
