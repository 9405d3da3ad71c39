use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{
    AssignmentRepository, PLATFORM_ADMIN_ROLE, RoleAssignment,
};
use pitchside_core::{AppError, AppResult, UserId};
use pitchside_domain::{Permission, RoleId, RoleScope, ScopeKey};

use crate::is_unique_violation;

/// PostgreSQL-backed repository for user-role assignments.
///
/// The `rbac_role_assignments_user_scope_unique` constraint is the arbiter
/// for the one-role-per-scope invariant; concurrent inserts for the same
/// `(user, scope key)` resolve to exactly one winner.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    role_name: String,
    scope: String,
    scope_id: Option<uuid::Uuid>,
    assigned_at: String,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<RoleAssignment> {
        let scope = self.scope.parse::<RoleScope>().map_err(|error| {
            AppError::Internal(format!(
                "invalid stored scope '{}' for assignment of user '{}': {error}",
                self.scope, self.user_id
            ))
        })?;

        Ok(RoleAssignment {
            user_id: UserId::from_uuid(self.user_id),
            role_id: RoleId::from_uuid(self.role_id),
            role_name: self.role_name,
            scope,
            scope_id: self.scope_id,
            assigned_at: self.assigned_at,
        })
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: ScopeKey,
    ) -> AppResult<RoleAssignment> {
        let role_name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let assigned_at = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO rbac_role_assignments (user_id, role_id, scope, scope_id)
            VALUES ($1, $2, $3, $4)
            RETURNING to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"')
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(scope.scope().as_str())
        .bind(scope.scope_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "user '{user_id}' already has a role in scope '{scope}'"
                ));
            }
            AppError::Internal(format!("failed to assign role: {error}"))
        })?;

        Ok(RoleAssignment {
            user_id,
            role_id,
            role_name,
            scope: scope.scope(),
            scope_id: scope.scope_id(),
            assigned_at,
        })
    }

    async fn remove_assignment(&self, user_id: UserId, scope: ScopeKey) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_role_assignments
            WHERE user_id = $1
                AND scope_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(scope.scope_id())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role assignment: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "no role assignment for user '{user_id}' in scope '{scope}'"
            )));
        }

        Ok(())
    }

    async fn list_assignments_for_scope(
        &self,
        scope: ScopeKey,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.user_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope,
                assignments.scope_id,
                to_char(assignments.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS assigned_at
            FROM rbac_role_assignments AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.scope = $1
                AND assignments.scope_id IS NOT DISTINCT FROM $2
            ORDER BY assignments.user_id, roles.name
            "#,
        )
        .bind(scope.scope().as_str())
        .bind(scope.scope_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?;

        rows.into_iter().map(AssignmentRow::into_assignment).collect()
    }

    async fn bootstrap_platform_admin(&self, user_id: UserId) -> AppResult<RoleAssignment> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (name, scope, scope_id, is_default)
            VALUES ($1, 'global', NULL, true)
            ON CONFLICT ON CONSTRAINT rbac_roles_name_scope_unique
                DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(PLATFORM_ADMIN_ROLE)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to ensure platform admin role: {error}"))
        })?;

        for permission in Permission::all_for_scope(RoleScope::Global) {
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
            .map_err(|error| AppError::Internal(format!("failed to ensure role grant: {error}")))?;
        }

        // Platform admin bootstrap replaces any prior global role.
        sqlx::query(
            r#"
            DELETE FROM rbac_role_assignments
            WHERE user_id = $1 AND scope_id IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear prior global assignment: {error}"))
        })?;

        let assigned_at = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO rbac_role_assignments (user_id, role_id, scope, scope_id)
            VALUES ($1, $2, 'global', NULL)
            RETURNING to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"')
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "user '{user_id}' already has a global role"
                ));
            }
            AppError::Internal(format!("failed to assign platform admin role: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleAssignment {
            user_id,
            role_id: RoleId::from_uuid(role_id),
            role_name: PLATFORM_ADMIN_ROLE.to_owned(),
            scope: RoleScope::Global,
            scope_id: None,
            assigned_at,
        })
    }
}
