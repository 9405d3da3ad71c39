use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use pitchside_domain::{
    AuditAction, EventId, OrganizationId, OrganizationStatus, Permission, ScopeKey,
};

use crate::{AuditEvent, AuditRepository, AuthorizationService, OrganizationRepository};

/// Event projection returned to callers. Events are the scope instances
/// behind event-scoped roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Stable event identifier.
    pub id: EventId,
    /// Hosting organization.
    pub organization_id: OrganizationId,
    /// Event name, unique within the organization.
    pub name: String,
    /// Start timestamp in RFC3339.
    pub starts_at: String,
    /// End timestamp in RFC3339.
    pub ends_at: String,
}

/// Input payload for event creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEventInput {
    /// Event name, unique within the organization.
    pub name: String,
    /// Start timestamp in RFC3339.
    pub starts_at: String,
    /// End timestamp in RFC3339.
    pub ends_at: String,
}

/// Repository port for event persistence.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persists an event. The storage layer enforces per-organization name
    /// uniqueness and reports a duplicate as [`AppError::Conflict`].
    async fn insert_event(
        &self,
        organization_id: OrganizationId,
        input: &CreateEventInput,
    ) -> AppResult<EventRecord>;

    /// Lists an organization's events.
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<EventRecord>>;
}

/// Application service for organization events.
#[derive(Clone)]
pub struct EventService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn EventRepository>,
    organization_repository: Arc<dyn OrganizationRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl EventService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn EventRepository>,
        organization_repository: Arc<dyn OrganizationRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            organization_repository,
            audit_repository,
        }
    }

    /// Creates an event for an approved organization.
    ///
    /// Events occupy venue time, so creation is gated on the same permission
    /// as slot management.
    pub async fn create_event(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        input: CreateEventInput,
    ) -> AppResult<EventRecord> {
        self.require_approved_organization(organization_id).await?;
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::ManageTimeSlots,
                ScopeKey::organization(organization_id.as_uuid()),
            )
            .await?;

        NonEmptyString::new(input.name.as_str())
            .map_err(|_| AppError::Validation("event name must not be empty".to_owned()))?;

        let event = self.repository.insert_event(organization_id, &input).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::EventCreated,
                resource_type: "event".to_owned(),
                resource_id: event.id.to_string(),
                detail: Some(format!(
                    "created event '{}' for organization '{organization_id}'",
                    event.name
                )),
            })
            .await?;

        Ok(event)
    }

    /// Lists an organization's events for its slot managers.
    pub async fn list_events(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<EventRecord>> {
        self.require_approved_organization(organization_id).await?;
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::ManageTimeSlots,
                ScopeKey::organization(organization_id.as_uuid()),
            )
            .await?;

        self.repository.list_for_organization(organization_id).await
    }

    async fn require_approved_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<()> {
        let organization = self
            .organization_repository
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("organization '{organization_id}' was not found"))
            })?;

        if organization.status != OrganizationStatus::Approved {
            return Err(AppError::Conflict(format!(
                "organization '{organization_id}' is not approved"
            )));
        }

        Ok(())
    }
}
