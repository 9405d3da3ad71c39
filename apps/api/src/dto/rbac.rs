use pitchside_application::{PermissionRecord, RoleAssignment, RoleDefinition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for role creation. The scope context comes from the
/// route, so the body carries only name and grants.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for replacing a role's permission set.
#[derive(Debug, Deserialize)]
pub struct UpdateRolePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for role assignment. The target user and scope context
/// come from the route.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

/// API representation of a permission catalog entry.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub name: String,
    pub description: Option<String>,
    pub scope: String,
}

/// API representation of an RBAC role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub scope: String,
    pub scope_id: Option<String>,
    pub is_default: bool,
    pub permissions: Vec<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub user_id: String,
    pub role_id: String,
    pub role_name: String,
    pub scope: String,
    pub scope_id: Option<String>,
    pub assigned_at: String,
}

impl From<PermissionRecord> for PermissionResponse {
    fn from(value: PermissionRecord) -> Self {
        Self {
            name: value.permission.as_str().to_owned(),
            description: value.description,
            scope: value.permission.scope().as_str().to_owned(),
        }
    }
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            scope: value.scope.as_str().to_owned(),
            scope_id: value.scope_id.map(|id| id.to_string()),
            is_default: value.is_default,
            permissions: value
                .permissions
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            role_id: value.role_id.to_string(),
            role_name: value.role_name,
            scope: value.scope.as_str().to_owned(),
            scope_id: value.scope_id.map(|id| id.to_string()),
            assigned_at: value.assigned_at,
        }
    }
}
