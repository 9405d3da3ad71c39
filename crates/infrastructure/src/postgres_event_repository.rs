use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pitchside_application::{CreateEventInput, EventRecord, EventRepository};
use pitchside_core::{AppError, AppResult};
use pitchside_domain::{EventId, OrganizationId};

use crate::is_unique_violation;

/// Postgres SQLSTATE class for invalid datetime input.
const INVALID_DATETIME: &str = "22007";

/// PostgreSQL-backed repository for organization events.
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: uuid::Uuid,
    organization_id: uuid::Uuid,
    name: String,
    starts_at: String,
    ends_at: String,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        }
    }
}

fn is_invalid_datetime(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some(INVALID_DATETIME);
    }

    false
}

const EVENT_COLUMNS: &str = r#"
    id,
    organization_id,
    name,
    to_char(starts_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS starts_at,
    to_char(ends_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS ends_at
"#;

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn insert_event(
        &self,
        organization_id: OrganizationId,
        input: &CreateEventInput,
    ) -> AppResult<EventRecord> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (organization_id, name, starts_at, ends_at)
            VALUES ($1, $2, $3::timestamptz, $4::timestamptz)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(organization_id.as_uuid())
        .bind(input.name.trim())
        .bind(input.starts_at.as_str())
        .bind(input.ends_at.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "event '{}' already exists in this organization",
                    input.name.trim()
                ));
            }
            if is_invalid_datetime(&error) {
                return AppError::Validation(
                    "event timestamps must be RFC3339 datetimes".to_owned(),
                );
            }
            AppError::Internal(format!("failed to create event: {error}"))
        })?;

        Ok(EventRecord::from(row))
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<EventRecord>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE organization_id = $1
            ORDER BY starts_at
            "#
        ))
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list events: {error}")))?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}
