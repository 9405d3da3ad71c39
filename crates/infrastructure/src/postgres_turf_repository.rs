use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{CreateTurfInput, TurfRecord, TurfRepository};
use pitchside_core::{AppError, AppResult};
use pitchside_domain::{OrganizationId, TurfId};

use crate::is_unique_violation;

/// PostgreSQL-backed repository for turf listings.
#[derive(Clone)]
pub struct PostgresTurfRepository {
    pool: PgPool,
}

impl PostgresTurfRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TurfRow {
    id: uuid::Uuid,
    organization_id: uuid::Uuid,
    name: String,
    sport: String,
    description: Option<String>,
}

impl From<TurfRow> for TurfRecord {
    fn from(row: TurfRow) -> Self {
        Self {
            id: TurfId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            sport: row.sport,
            description: row.description,
        }
    }
}

#[async_trait]
impl TurfRepository for PostgresTurfRepository {
    async fn insert_turf(
        &self,
        organization_id: OrganizationId,
        input: &CreateTurfInput,
    ) -> AppResult<TurfRecord> {
        let row = sqlx::query_as::<_, TurfRow>(
            r#"
            INSERT INTO turfs (organization_id, name, sport, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, name, sport, description
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(input.name.trim())
        .bind(input.sport.trim())
        .bind(input.description.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "turf '{}' already exists in this organization",
                    input.name.trim()
                ));
            }
            AppError::Internal(format!("failed to create turf: {error}"))
        })?;

        Ok(TurfRecord::from(row))
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TurfRecord>> {
        let rows = sqlx::query_as::<_, TurfRow>(
            r#"
            SELECT id, organization_id, name, sport, description
            FROM turfs
            WHERE organization_id = $1
            ORDER BY name
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list turfs: {error}")))?;

        Ok(rows.into_iter().map(TurfRecord::from).collect())
    }
}
