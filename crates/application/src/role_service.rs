use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use pitchside_domain::{
    AuditAction, Permission, RoleId, RoleScope, ScopeKey, validate_role_permissions,
};
use uuid::Uuid;

use crate::{AuditEvent, AuditRepository, AuthorizationService};

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Role name, unique within its scope context.
    pub name: String,
    /// Scope the role applies at.
    pub scope: RoleScope,
    /// Bound scope instance, absent for global roles.
    pub scope_id: Option<Uuid>,
    /// Marks a system-managed role protected from deletion.
    pub is_default: bool,
    /// Effective role grants.
    pub permissions: Vec<Permission>,
}

impl RoleDefinition {
    /// Returns the scope key this role is bound to.
    pub fn scope_key(&self) -> AppResult<ScopeKey> {
        ScopeKey::new(self.scope, self.scope_id)
    }
}

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within the scope context.
    pub name: String,
    /// Scope the role applies at.
    pub scope: RoleScope,
    /// Bound scope instance, required for non-global scopes.
    pub scope_id: Option<Uuid>,
    /// Grants to attach to the role.
    pub permissions: Vec<Permission>,
}

/// Repository port for role persistence.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role with its grants. The storage layer enforces
    /// `(name, scope, scope_id)` uniqueness and reports a duplicate as
    /// [`AppError::Conflict`].
    async fn insert_role(&self, input: &CreateRoleInput) -> AppResult<RoleDefinition>;

    /// Loads a role with its grants.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>>;

    /// Replaces the role's grant set in one atomic unit.
    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: &[Permission],
    ) -> AppResult<RoleDefinition>;

    /// Lists roles bound to one scope key.
    async fn list_roles_for_scope(&self, scope: ScopeKey) -> AppResult<Vec<RoleDefinition>>;

    /// Deletes a role together with its dependent assignments, atomically.
    async fn delete_role_with_assignments(&self, role_id: RoleId) -> AppResult<()>;
}

/// Repository port for verifying scope-instance references.
///
/// Role storage holds plain ids with no referential integrity to the
/// organization and event tables, so every reference is checked explicitly
/// before it is trusted.
#[async_trait]
pub trait ScopeInstanceRepository: Send + Sync {
    /// Returns whether the scope instance behind the key exists. The global
    /// key always exists.
    async fn scope_instance_exists(&self, scope: ScopeKey) -> AppResult<bool>;

    /// Resolves the organization hosting an event, if the event exists.
    async fn organization_of_event(&self, event_id: Uuid) -> AppResult<Option<Uuid>>;
}

/// Application service for role administration.
#[derive(Clone)]
pub struct RoleService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RoleRepository>,
    scope_instances: Arc<dyn ScopeInstanceRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RoleRepository>,
        scope_instances: Arc<dyn ScopeInstanceRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            scope_instances,
            audit_repository,
        }
    }

    /// Creates a role after scope, permission, and existence validation.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let scope_key = ScopeKey::new(input.scope, input.scope_id)?;
        self.require_role_management(actor, scope_key).await?;

        NonEmptyString::new(input.name.as_str())
            .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))?;
        validate_role_permissions(input.scope, &input.permissions)?;
        self.require_scope_instance(scope_key).await?;

        let role = self.repository.insert_role(&input).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RoleCreated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.role_id.to_string(),
                detail: Some(format!(
                    "created role '{}' in scope '{scope_key}'",
                    role.name
                )),
            })
            .await?;

        Ok(role)
    }

    /// Replaces a role's permission set.
    pub async fn update_role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        permissions: Vec<Permission>,
    ) -> AppResult<RoleDefinition> {
        let role = self.load_role(role_id).await?;
        let scope_key = role.scope_key()?;
        self.require_role_management(actor, scope_key).await?;

        validate_role_permissions(role.scope, &permissions)?;

        let updated = self
            .repository
            .replace_role_permissions(role_id, &permissions)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RolePermissionsUpdated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!(
                    "replaced permission set of role '{}' ({} grants)",
                    updated.name,
                    updated.permissions.len()
                )),
            })
            .await?;

        Ok(updated)
    }

    /// Lists the roles bound to one scope instance.
    pub async fn roles_for_scope_instance(
        &self,
        actor: &UserIdentity,
        scope: RoleScope,
        scope_id: Option<Uuid>,
    ) -> AppResult<Vec<RoleDefinition>> {
        let scope_key = ScopeKey::new(scope, scope_id)?;
        self.require_role_management(actor, scope_key).await?;
        self.require_scope_instance(scope_key).await?;

        self.repository.list_roles_for_scope(scope_key).await
    }

    /// Deletes a role and its assignments. Default roles are protected.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        let role = self.load_role(role_id).await?;
        let scope_key = role.scope_key()?;
        self.require_role_management(actor, scope_key).await?;

        if role.is_default {
            return Err(AppError::Forbidden(format!(
                "role '{}' is system-managed and cannot be deleted",
                role.name
            )));
        }

        self.repository.delete_role_with_assignments(role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RoleDeleted,
                resource_type: "rbac_role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!("deleted role '{}'", role.name)),
            })
            .await
    }

    pub(crate) async fn load_role(&self, role_id: RoleId) -> AppResult<RoleDefinition> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Gate for role administration in one scope context.
    ///
    /// Global roles require `manage_user_global_roles`; organization roles
    /// require `manage_organization_roles` at that organization; event roles
    /// accept `manage_event_roles` at the event or, as the bootstrap path,
    /// `manage_organization_roles` at the hosting organization.
    pub(crate) async fn require_role_management(
        &self,
        actor: &UserIdentity,
        scope_key: ScopeKey,
    ) -> AppResult<()> {
        match scope_key.scope() {
            RoleScope::Global => {
                self.authorization_service
                    .require_permission(
                        actor.user_id(),
                        Permission::ManageUserGlobalRoles,
                        ScopeKey::global(),
                    )
                    .await
            }
            RoleScope::Organization => {
                self.authorization_service
                    .require_permission(
                        actor.user_id(),
                        Permission::ManageOrganizationRoles,
                        scope_key,
                    )
                    .await
            }
            RoleScope::Event => {
                if self
                    .authorization_service
                    .has_permission(actor.user_id(), Permission::ManageEventRoles, scope_key)
                    .await?
                {
                    return Ok(());
                }

                let Some(event_id) = scope_key.scope_id() else {
                    return Err(AppError::Validation(
                        "event scope requires a scope id".to_owned(),
                    ));
                };

                let organization_id = self
                    .scope_instances
                    .organization_of_event(event_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("event '{event_id}' was not found"))
                    })?;

                self.authorization_service
                    .require_permission(
                        actor.user_id(),
                        Permission::ManageOrganizationRoles,
                        ScopeKey::organization(organization_id),
                    )
                    .await
            }
        }
    }

    pub(crate) async fn require_scope_instance(&self, scope_key: ScopeKey) -> AppResult<()> {
        if self.scope_instances.scope_instance_exists(scope_key).await? {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "{} '{}' was not found",
            scope_key.scope().instance_kind(),
            scope_key
                .scope_id()
                .map(|id| id.to_string())
                .unwrap_or_default()
        )))
    }
}
