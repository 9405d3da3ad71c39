use pitchside_application::{EventRecord, OrganizationRecord, TurfRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for organization registration requests.
#[derive(Debug, Deserialize)]
pub struct RegisterOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Incoming payload for owner assignment.
#[derive(Debug, Deserialize)]
pub struct AssignOwnerRequest {
    pub user_id: Uuid,
}

/// Incoming payload for turf creation.
#[derive(Debug, Deserialize)]
pub struct CreateTurfRequest {
    pub name: String,
    pub sport: String,
    pub description: Option<String>,
}

/// Incoming payload for event creation.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub starts_at: String,
    pub ends_at: String,
}

/// API representation of an organization.
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub requested_by: String,
    pub owner_user_id: Option<String>,
}

/// API representation of a turf listing.
#[derive(Debug, Serialize)]
pub struct TurfResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub sport: String,
    pub description: Option<String>,
}

/// API representation of an event.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub starts_at: String,
    pub ends_at: String,
}

impl From<OrganizationRecord> for OrganizationResponse {
    fn from(value: OrganizationRecord) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            description: value.description,
            status: value.status.as_str().to_owned(),
            requested_by: value.requested_by.to_string(),
            owner_user_id: value.owner_user_id.map(|id| id.to_string()),
        }
    }
}

impl From<TurfRecord> for TurfResponse {
    fn from(value: TurfRecord) -> Self {
        Self {
            id: value.id.to_string(),
            organization_id: value.organization_id.to_string(),
            name: value.name,
            sport: value.sport,
            description: value.description,
        }
    }
}

impl From<EventRecord> for EventResponse {
    fn from(value: EventRecord) -> Self {
        Self {
            id: value.id.to_string(),
            organization_id: value.organization_id.to_string(),
            name: value.name,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
        }
    }
}
