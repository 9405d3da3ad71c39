use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{CreateRoleInput, RoleDefinition, RoleRepository};
use pitchside_core::{AppError, AppResult};
use pitchside_domain::{Permission, RoleId, RoleScope, ScopeKey};

use crate::is_unique_violation;

/// PostgreSQL-backed repository for role administration.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    scope: String,
    scope_id: Option<uuid::Uuid>,
    is_default: bool,
    permission: Option<String>,
}

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.name AS role_name,
        roles.scope,
        roles.scope_id,
        roles.is_default,
        grants.permission
    FROM rbac_roles AS roles
    LEFT JOIN rbac_role_grants AS grants
        ON grants.role_id = roles.id
"#;

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert_role(&self, input: &CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (name, scope, scope_id, is_default)
            VALUES ($1, $2, $3, false)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(input.scope.as_str())
        .bind(input.scope_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, input.name.as_str()))?;

        for permission in &input.permissions {
            sqlx::query(
                r#"
                INSERT INTO rbac_role_grants (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleDefinition {
            role_id: RoleId::from_uuid(role_id),
            name: input.name.trim().to_owned(),
            scope: input.scope,
            scope_id: input.scope_id,
            is_default: false,
            permissions: input.permissions.clone(),
        })
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{ROLE_SELECT} WHERE roles.id = $1"))
            .bind(role_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[Permission],
    ) -> AppResult<RoleDefinition> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let exists = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM rbac_roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        sqlx::query("DELETE FROM rbac_role_grants WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear role grants: {error}"))
            })?;

        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO rbac_role_grants (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn list_roles_for_scope(&self, scope: ScopeKey) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            {ROLE_SELECT}
            WHERE roles.scope = $1
                AND roles.scope_id IS NOT DISTINCT FROM $2
            ORDER BY roles.name, grants.permission
            "#
        ))
        .bind(scope.scope().as_str())
        .bind(scope.scope_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn delete_role_with_assignments(&self, role_id: RoleId) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query("DELETE FROM rbac_role_assignments WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete role assignments: {error}"))
            })?;

        let rows_affected = sqlx::query("DELETE FROM rbac_roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<RoleDefinition>> {
    let mut by_id: HashMap<uuid::Uuid, RoleDefinition> = HashMap::new();

    for row in rows {
        let scope = RoleScope::from_str(row.scope.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored scope '{}' for role '{}': {error}",
                row.scope, row.role_id
            ))
        })?;

        let role = by_id.entry(row.role_id).or_insert_with(|| RoleDefinition {
            role_id: RoleId::from_uuid(row.role_id),
            name: row.role_name.clone(),
            scope,
            scope_id: row.scope_id,
            is_default: row.is_default,
            permissions: Vec::new(),
        });

        if let Some(permission_value) = row.permission {
            let permission = Permission::from_str(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{}' for role '{}': {error}",
                    permission_value, row.role_id
                ))
            })?;

            role.permissions.push(permission);
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if is_unique_violation(&error) {
        return AppError::Conflict(format!(
            "role '{role_name}' already exists in this scope"
        ));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}
