//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod audit;
mod authorization_service;
mod catalog_service;
mod event_service;
mod organization_service;
mod role_service;
mod turf_service;
mod user_service;

pub use assignment_service::{
    AssignRoleInput, AssignmentRepository, PLATFORM_ADMIN_ROLE, RoleAssignment,
    RoleAssignmentService,
};
pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use catalog_service::{PermissionCatalogRepository, PermissionCatalogService, PermissionRecord};
pub use event_service::{CreateEventInput, EventRecord, EventRepository, EventService};
pub use organization_service::{
    ORGANIZATION_OWNER_ROLE, OrganizationRecord, OrganizationRepository, OrganizationService,
    RegisterOrganizationInput,
};
pub use role_service::{
    CreateRoleInput, RoleDefinition, RoleRepository, RoleService, ScopeInstanceRepository,
};
pub use turf_service::{CreateTurfInput, TurfRecord, TurfRepository, TurfService};
pub use user_service::{
    AuthOutcome, PasswordHasher, RegisterParams, UserRecord, UserRepository, UserService,
};
