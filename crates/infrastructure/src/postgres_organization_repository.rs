use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{
    ORGANIZATION_OWNER_ROLE, OrganizationRecord, OrganizationRepository,
    RegisterOrganizationInput,
};
use pitchside_core::{AppError, AppResult, UserId};
use pitchside_domain::{OrganizationId, OrganizationStatus, Permission, RoleScope};

use crate::is_unique_violation;

/// PostgreSQL-backed repository for organizations and owner bootstrap.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
    status: String,
    requested_by: uuid::Uuid,
    owner_user_id: Option<uuid::Uuid>,
}

impl OrganizationRow {
    fn into_record(self) -> AppResult<OrganizationRecord> {
        let status = OrganizationStatus::parse(self.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored status '{}' for organization '{}': {error}",
                self.status, self.id
            ))
        })?;

        Ok(OrganizationRecord {
            id: OrganizationId::from_uuid(self.id),
            name: self.name,
            description: self.description,
            status,
            requested_by: UserId::from_uuid(self.requested_by),
            owner_user_id: self.owner_user_id.map(UserId::from_uuid),
        })
    }
}

const ORGANIZATION_COLUMNS: &str =
    "id, name, description, status, requested_by, owner_user_id";

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn insert_request(
        &self,
        input: &RegisterOrganizationInput,
        requested_by: UserId,
    ) -> AppResult<OrganizationRecord> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            INSERT INTO organizations (name, description, requested_by)
            VALUES ($1, $2, $3)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(requested_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "organization '{}' already exists",
                    input.name.trim()
                ));
            }
            AppError::Internal(format!("failed to create organization request: {error}"))
        })?;

        row.into_record()
    }

    async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<OrganizationRecord>> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load organization: {error}")))?;

        row.map(OrganizationRow::into_record).transpose()
    }

    async fn list_by_status(
        &self,
        status: OrganizationStatus,
    ) -> AppResult<Vec<OrganizationRecord>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            SELECT {ORGANIZATION_COLUMNS}
            FROM organizations
            WHERE status = $1
            ORDER BY name
            "#
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list organizations: {error}")))?;

        rows.into_iter().map(OrganizationRow::into_record).collect()
    }

    async fn transition_status(
        &self,
        id: OrganizationId,
        from: OrganizationStatus,
        to: OrganizationStatus,
    ) -> AppResult<OrganizationRecord> {
        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            UPDATE organizations
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update organization status: {error}"))
        })?;

        if let Some(row) = row {
            return row.into_record();
        }

        // The compare-and-set missed: distinguish absent from wrong state.
        match self.find_by_id(id).await? {
            Some(organization) => Err(AppError::Conflict(format!(
                "organization '{id}' is {}, not {from}",
                organization.status
            ))),
            None => Err(AppError::NotFound(format!(
                "organization '{id}' was not found"
            ))),
        }
    }

    async fn assign_owner(
        &self,
        id: OrganizationId,
        owner: UserId,
    ) -> AppResult<OrganizationRecord> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            SELECT {ORGANIZATION_COLUMNS}
            FROM organizations
            WHERE id = $1
            FOR UPDATE
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock organization: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("organization '{id}' was not found")))?;

        let organization = row.into_record()?;

        if organization.status != OrganizationStatus::Approved {
            return Err(AppError::Conflict(format!(
                "organization '{id}' is not approved"
            )));
        }

        if organization.owner_user_id.is_some() {
            return Err(AppError::Conflict(format!(
                "organization '{id}' already has an owner"
            )));
        }

        // Find-or-create the default owner role with every organization-scoped
        // permission from the catalog.
        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (name, scope, scope_id, is_default)
            VALUES ($1, 'organization', $2, true)
            ON CONFLICT ON CONSTRAINT rbac_roles_name_scope_unique
                DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(ORGANIZATION_OWNER_ROLE)
        .bind(id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure owner role: {error}")))?;

        for permission in Permission::all_for_scope(RoleScope::Organization) {
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

        // Owner assignment replaces any role the user held in this organization.
        sqlx::query(
            r#"
            DELETE FROM rbac_role_assignments
            WHERE user_id = $1 AND scope_id = $2
            "#,
        )
        .bind(owner.as_uuid())
        .bind(id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear prior assignment: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO rbac_role_assignments (user_id, role_id, scope, scope_id)
            VALUES ($1, $2, 'organization', $3)
            "#,
        )
        .bind(owner.as_uuid())
        .bind(role_id)
        .bind(id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign owner role: {error}")))?;

        let row = sqlx::query_as::<_, OrganizationRow>(&format!(
            r#"
            UPDATE organizations
            SET owner_user_id = $2
            WHERE id = $1
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to stamp owner: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        row.into_record()
    }
}
