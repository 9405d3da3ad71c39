mod auth;
mod common;
mod organizations;
mod rbac;

pub use auth::{AuthLoginRequest, AuthRegisterRequest, BootstrapRequest};
pub use common::{GenericMessageResponse, HealthResponse, UserIdentityResponse};
pub use organizations::{
    AssignOwnerRequest, CreateEventRequest, CreateTurfRequest, EventResponse,
    OrganizationResponse, RegisterOrganizationRequest, TurfResponse,
};
pub use rbac::{
    AssignRoleRequest, CreateRoleRequest, PermissionResponse, RoleAssignmentResponse,
    RoleResponse, UpdateRolePermissionsRequest,
};
