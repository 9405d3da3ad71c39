use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, UserId};
use pitchside_domain::{Permission, ScopeKey};

/// Repository port for effective-permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists the permissions a user holds through their role assignment for
    /// one scope key. An empty list means the user holds no role there, or a
    /// role with no grants; both are ordinary outcomes, not errors.
    async fn list_permissions_for_user(
        &self,
        user_id: UserId,
        scope: ScopeKey,
    ) -> AppResult<Vec<Permission>>;
}

/// Application service answering permission checks for guarded operations.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the user holds the permission in the given scope.
    ///
    /// "No assignment" and "role with no grants" both answer `false`; only
    /// infrastructure failures are errors.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission: Permission,
        scope: ScopeKey,
    ) -> AppResult<bool> {
        let permissions = self
            .repository
            .list_permissions_for_user(user_id, scope)
            .await?;

        Ok(permissions.contains(&permission))
    }

    /// Ensures the user holds the required permission in the given scope.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        permission: Permission,
        scope: ScopeKey,
    ) -> AppResult<()> {
        if self.has_permission(user_id, permission, scope).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{user_id}' is missing permission '{}' in scope '{scope}'",
            permission.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchside_core::{AppError, AppResult, UserId};
    use pitchside_domain::{Permission, ScopeKey};
    use uuid::Uuid;

    use super::{AuthorizationRepository, AuthorizationService};

    struct FakeAuthorizationRepository {
        grants: HashMap<(UserId, ScopeKey), Vec<Permission>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_user(
            &self,
            user_id: UserId,
            scope: ScopeKey,
        ) -> AppResult<Vec<Permission>> {
            Ok(self
                .grants
                .get(&(user_id, scope))
                .cloned()
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn granted_permission_is_allowed() {
        let user_id = UserId::new();
        let organization_id = Uuid::new_v4();
        let scope = ScopeKey::organization(organization_id);
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::from([((user_id, scope), vec![Permission::ViewTurf])]),
        }));

        let allowed = service
            .has_permission(user_id, Permission::ViewTurf, scope)
            .await;
        assert_eq!(allowed.ok(), Some(true));
    }

    #[tokio::test]
    async fn missing_assignment_answers_false_not_error() {
        let user_id = UserId::new();
        let scope = ScopeKey::organization(Uuid::new_v4());
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::new(),
        }));

        let allowed = service
            .has_permission(user_id, Permission::ViewTurf, scope)
            .await;
        assert_eq!(allowed.ok(), Some(false));
    }

    #[tokio::test]
    async fn permission_outside_held_set_answers_false() {
        let user_id = UserId::new();
        let organization_id = Uuid::new_v4();
        let scope = ScopeKey::organization(organization_id);
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::from([((user_id, scope), vec![Permission::ViewTurf])]),
        }));

        let allowed = service
            .has_permission(user_id, Permission::ManageOrganizationRoles, scope)
            .await;
        assert_eq!(allowed.ok(), Some(false));
    }

    #[tokio::test]
    async fn require_permission_denies_missing_grant() {
        let user_id = UserId::new();
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::new(),
        }));

        let result = service
            .require_permission(user_id, Permission::AccessAdminDashboard, ScopeKey::global())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn global_and_scoped_grants_do_not_leak_across_keys() {
        let user_id = UserId::new();
        let organization_id = Uuid::new_v4();
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository {
            grants: HashMap::from([(
                (user_id, ScopeKey::global()),
                vec![Permission::AccessAdminDashboard],
            )]),
        }));

        let scoped = service
            .has_permission(
                user_id,
                Permission::ViewTurf,
                ScopeKey::organization(organization_id),
            )
            .await;
        assert_eq!(scoped.ok(), Some(false));

        let global = service
            .has_permission(user_id, Permission::AccessAdminDashboard, ScopeKey::global())
            .await;
        assert_eq!(global.ok(), Some(true));
    }
}
