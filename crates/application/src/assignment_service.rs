use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, UserId, UserIdentity};
use pitchside_domain::{AuditAction, RoleId, RoleScope, ScopeKey};
use uuid::Uuid;

use crate::{AuditEvent, AuditRepository, RoleService, UserRepository};

/// Name of the system-managed global administrator role.
pub const PLATFORM_ADMIN_ROLE: &str = "Platform Administrator";

/// Assignment projection binding a user to a role in one scope context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Role name, for admin views.
    pub role_name: String,
    /// Scope copied from the role at assignment time.
    pub scope: RoleScope,
    /// Scope instance copied from the role at assignment time.
    pub scope_id: Option<Uuid>,
    /// Assignment timestamp in RFC3339.
    pub assigned_at: String,
}

/// Input payload for role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Target user.
    pub user_id: UserId,
    /// Role to assign.
    pub role_id: RoleId,
    /// Scope the caller believes the role applies at.
    pub scope: RoleScope,
    /// Scope instance the caller believes the role is bound to.
    pub scope_id: Option<Uuid>,
}

/// Repository port for role-assignment persistence.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Conditionally inserts an assignment keyed by `(user, scope key)`.
    ///
    /// The storage layer owns the uniqueness boundary: when the user already
    /// holds a role for the key, the insert loses and surfaces
    /// [`AppError::Conflict`], also under concurrent attempts.
    async fn insert_assignment(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: ScopeKey,
    ) -> AppResult<RoleAssignment>;

    /// Removes the user's assignment for one scope key.
    async fn remove_assignment(&self, user_id: UserId, scope: ScopeKey) -> AppResult<()>;

    /// Lists assignments bound to one scope key.
    async fn list_assignments_for_scope(&self, scope: ScopeKey)
    -> AppResult<Vec<RoleAssignment>>;

    /// Promotes a user to the system-managed global administrator role:
    /// find-or-create the role with every global permission, replace any
    /// existing global assignment, one atomic unit.
    async fn bootstrap_platform_admin(&self, user_id: UserId) -> AppResult<RoleAssignment>;
}

/// Application service for user-role assignment administration.
#[derive(Clone)]
pub struct RoleAssignmentService {
    role_service: RoleService,
    repository: Arc<dyn AssignmentRepository>,
    user_repository: Arc<dyn UserRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        role_service: RoleService,
        repository: Arc<dyn AssignmentRepository>,
        user_repository: Arc<dyn UserRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            role_service,
            repository,
            user_repository,
            audit_repository,
        }
    }

    /// Assigns a role to a user within one scope context.
    ///
    /// The caller passes the scope it believes the role applies at; a
    /// mismatch against the stored role is rejected to catch mis-wired
    /// callers before any write happens.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let scope_key = ScopeKey::new(input.scope, input.scope_id)?;
        self.role_service
            .require_role_management(actor, scope_key)
            .await?;

        self.require_user(input.user_id).await?;

        let role = self.role_service.load_role(input.role_id).await?;
        if role.scope != input.scope || role.scope_id != input.scope_id {
            return Err(AppError::Validation(format!(
                "scope mismatch: role '{}' is bound to '{}', not '{scope_key}'",
                role.name,
                role.scope_key()?
            )));
        }

        self.role_service.require_scope_instance(scope_key).await?;

        let assignment = self
            .repository
            .insert_assignment(input.user_id, input.role_id, scope_key)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RoleAssigned,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: format!("{}:{scope_key}", input.user_id),
                detail: Some(format!(
                    "assigned role '{}' to user '{}' in scope '{scope_key}'",
                    assignment.role_name, input.user_id
                )),
            })
            .await?;

        Ok(assignment)
    }

    /// Removes a user's role assignment for one scope context.
    pub async fn unassign_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        scope: RoleScope,
        scope_id: Option<Uuid>,
    ) -> AppResult<()> {
        let scope_key = ScopeKey::new(scope, scope_id)?;
        self.role_service
            .require_role_management(actor, scope_key)
            .await?;

        self.repository.remove_assignment(user_id, scope_key).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::RoleUnassigned,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: format!("{user_id}:{scope_key}"),
                detail: Some(format!(
                    "removed role assignment of user '{user_id}' in scope '{scope_key}'"
                )),
            })
            .await
    }

    /// Lists role assignments within one scope context.
    pub async fn assignments_for_scope_instance(
        &self,
        actor: &UserIdentity,
        scope: RoleScope,
        scope_id: Option<Uuid>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let scope_key = ScopeKey::new(scope, scope_id)?;
        self.role_service
            .require_role_management(actor, scope_key)
            .await?;
        self.role_service.require_scope_instance(scope_key).await?;

        self.repository.list_assignments_for_scope(scope_key).await
    }

    /// Promotes a user to platform administrator.
    ///
    /// Token-guarded at the HTTP boundary rather than permission-gated; this
    /// is how the first administrator comes to exist.
    pub async fn bootstrap_platform_admin(&self, user_id: UserId) -> AppResult<RoleAssignment> {
        self.require_user(user_id).await?;

        let assignment = self.repository.bootstrap_platform_admin(user_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: user_id,
                action: AuditAction::PlatformAdminBootstrapped,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: format!("{user_id}:global"),
                detail: Some(format!(
                    "bootstrapped user '{user_id}' as '{PLATFORM_ADMIN_ROLE}'"
                )),
            })
            .await?;

        Ok(assignment)
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<()> {
        if self.user_repository.find_by_id(user_id).await?.is_some() {
            return Ok(());
        }

        Err(AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}
