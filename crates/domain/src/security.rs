use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pitchside_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Breadth at which a role or permission applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Platform-wide.
    Global,
    /// One organization.
    Organization,
    /// One event hosted by an organization.
    Event,
}

impl RoleScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Organization => "organization",
            Self::Event => "event",
        }
    }

    /// Returns the label used when a scope instance of this kind is missing.
    #[must_use]
    pub fn instance_kind(&self) -> &'static str {
        match self {
            Self::Global => "platform",
            Self::Organization => "organization",
            Self::Event => "event",
        }
    }

    /// Whether roles at this scope must be bound to a scope instance.
    #[must_use]
    pub fn requires_instance(&self) -> bool {
        !matches!(self, Self::Global)
    }
}

impl FromStr for RoleScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(Self::Global),
            "organization" => Ok(Self::Organization),
            "event" => Ok(Self::Event),
            _ => Err(AppError::Validation(format!("unknown scope '{value}'"))),
        }
    }
}

impl Display for RoleScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Permissions enforced by application policy checks.
///
/// The catalog is seeded into storage by migration; this enum is the closed
/// set of values those rows may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows access to the platform admin dashboard.
    AccessAdminDashboard,
    /// Allows assigning and removing global roles for any user.
    ManageUserGlobalRoles,
    /// Allows reviewing and deciding organization registration requests.
    ManageOrganizationRequests,
    /// Allows assigning the owner of an approved organization.
    AssignOrganizationOwner,
    /// Allows viewing an organization's turf listings.
    ViewTurf,
    /// Allows creating and editing an organization's turfs.
    ManageTurfs,
    /// Allows managing an organization's bookable time slots and events.
    ManageTimeSlots,
    /// Allows managing an organization's bookings.
    ManageBookings,
    /// Allows viewing an organization's reports.
    ViewOrganizationReports,
    /// Allows managing roles and assignments within an organization.
    ManageOrganizationRoles,
    /// Allows viewing an event's details.
    ViewEventDetails,
    /// Allows editing an event's schedule.
    ManageEventSchedule,
    /// Allows managing roles and assignments within an event.
    ManageEventRoles,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessAdminDashboard => "access_admin_dashboard",
            Self::ManageUserGlobalRoles => "manage_user_global_roles",
            Self::ManageOrganizationRequests => "manage_organization_requests",
            Self::AssignOrganizationOwner => "assign_organization_owner",
            Self::ViewTurf => "view_turf",
            Self::ManageTurfs => "manage_turfs",
            Self::ManageTimeSlots => "manage_time_slots",
            Self::ManageBookings => "manage_bookings",
            Self::ViewOrganizationReports => "view_organization_reports",
            Self::ManageOrganizationRoles => "manage_organization_roles",
            Self::ViewEventDetails => "view_event_details",
            Self::ManageEventSchedule => "manage_event_schedule",
            Self::ManageEventRoles => "manage_event_roles",
        }
    }

    /// Returns the scope this permission applies at.
    #[must_use]
    pub fn scope(&self) -> RoleScope {
        match self {
            Self::AccessAdminDashboard
            | Self::ManageUserGlobalRoles
            | Self::ManageOrganizationRequests
            | Self::AssignOrganizationOwner => RoleScope::Global,
            Self::ViewTurf
            | Self::ManageTurfs
            | Self::ManageTimeSlots
            | Self::ManageBookings
            | Self::ViewOrganizationReports
            | Self::ManageOrganizationRoles => RoleScope::Organization,
            Self::ViewEventDetails | Self::ManageEventSchedule | Self::ManageEventRoles => {
                RoleScope::Event
            }
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::AccessAdminDashboard,
            Permission::ManageUserGlobalRoles,
            Permission::ManageOrganizationRequests,
            Permission::AssignOrganizationOwner,
            Permission::ViewTurf,
            Permission::ManageTurfs,
            Permission::ManageTimeSlots,
            Permission::ManageBookings,
            Permission::ViewOrganizationReports,
            Permission::ManageOrganizationRoles,
            Permission::ViewEventDetails,
            Permission::ManageEventSchedule,
            Permission::ManageEventRoles,
        ];

        ALL
    }

    /// Returns all permissions applying at the given scope.
    #[must_use]
    pub fn all_for_scope(scope: RoleScope) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|permission| permission.scope() == scope)
            .collect()
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "access_admin_dashboard" => Ok(Self::AccessAdminDashboard),
            "manage_user_global_roles" => Ok(Self::ManageUserGlobalRoles),
            "manage_organization_requests" => Ok(Self::ManageOrganizationRequests),
            "assign_organization_owner" => Ok(Self::AssignOrganizationOwner),
            "view_turf" => Ok(Self::ViewTurf),
            "manage_turfs" => Ok(Self::ManageTurfs),
            "manage_time_slots" => Ok(Self::ManageTimeSlots),
            "manage_bookings" => Ok(Self::ManageBookings),
            "view_organization_reports" => Ok(Self::ViewOrganizationReports),
            "manage_organization_roles" => Ok(Self::ManageOrganizationRoles),
            "view_event_details" => Ok(Self::ViewEventDetails),
            "manage_event_schedule" => Ok(Self::ManageEventSchedule),
            "manage_event_roles" => Ok(Self::ManageEventRoles),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a role identifier from its canonical string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("malformed role id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The scope context a role or assignment is bound to.
///
/// A key is global with no instance, or organization/event-scoped with the
/// bound instance id. The pairing rule is enforced at construction; no other
/// combination can exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    scope: RoleScope,
    scope_id: Option<Uuid>,
}

impl ScopeKey {
    /// Creates a validated scope key.
    ///
    /// `scope_id` must be absent for the global scope and present otherwise.
    pub fn new(scope: RoleScope, scope_id: Option<Uuid>) -> AppResult<Self> {
        match (scope.requires_instance(), scope_id) {
            (false, Some(_)) => Err(AppError::Validation(
                "global scope must not carry a scope id".to_owned(),
            )),
            (true, None) => Err(AppError::Validation(format!(
                "{scope} scope requires a scope id"
            ))),
            _ => Ok(Self { scope, scope_id }),
        }
    }

    /// Creates the global scope key.
    #[must_use]
    pub fn global() -> Self {
        Self {
            scope: RoleScope::Global,
            scope_id: None,
        }
    }

    /// Creates a key bound to one organization.
    #[must_use]
    pub fn organization(id: Uuid) -> Self {
        Self {
            scope: RoleScope::Organization,
            scope_id: Some(id),
        }
    }

    /// Creates a key bound to one event.
    #[must_use]
    pub fn event(id: Uuid) -> Self {
        Self {
            scope: RoleScope::Event,
            scope_id: Some(id),
        }
    }

    /// Returns the scope.
    #[must_use]
    pub fn scope(&self) -> RoleScope {
        self.scope
    }

    /// Returns the bound scope instance id, absent for global.
    #[must_use]
    pub fn scope_id(&self) -> Option<Uuid> {
        self.scope_id
    }
}

impl Display for ScopeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.scope_id {
            Some(id) => write!(formatter, "{}:{id}", self.scope),
            None => formatter.write_str(self.scope.as_str()),
        }
    }
}

/// Validates that every permission applies at the role's scope.
///
/// Fails with a validation error naming the offending permissions, so the
/// caller can report exactly which requested grants were out of scope.
pub fn validate_role_permissions(scope: RoleScope, permissions: &[Permission]) -> AppResult<()> {
    let offending: Vec<&str> = permissions
        .iter()
        .filter(|permission| permission.scope() != scope)
        .map(Permission::as_str)
        .collect();

    if offending.is_empty() {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "permissions not valid for {scope} scope: {}",
        offending.join(", ")
    )))
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role's permission set is replaced.
    RolePermissionsUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a role assignment is removed.
    RoleUnassigned,
    /// Emitted when an organization registration request is submitted.
    OrganizationRequested,
    /// Emitted when an organization request is approved.
    OrganizationApproved,
    /// Emitted when an organization request is rejected.
    OrganizationRejected,
    /// Emitted when an organization owner is assigned.
    OrganizationOwnerAssigned,
    /// Emitted when a user is promoted to platform administrator.
    PlatformAdminBootstrapped,
    /// Emitted when a turf listing is created.
    TurfCreated,
    /// Emitted when an event is created.
    EventCreated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RolePermissionsUpdated => "rbac.role.permissions_updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::RoleAssigned => "rbac.role.assigned",
            Self::RoleUnassigned => "rbac.role.unassigned",
            Self::OrganizationRequested => "organization.requested",
            Self::OrganizationApproved => "organization.approved",
            Self::OrganizationRejected => "organization.rejected",
            Self::OrganizationOwnerAssigned => "organization.owner_assigned",
            Self::PlatformAdminBootstrapped => "platform.admin_bootstrapped",
            Self::TurfCreated => "turf.created",
            Self::EventCreated => "event.created",
        }
    }
}
