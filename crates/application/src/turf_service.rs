use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use pitchside_domain::{
    AuditAction, OrganizationId, OrganizationStatus, Permission, ScopeKey, TurfId,
};

use crate::{AuditEvent, AuditRepository, AuthorizationService, OrganizationRepository};

/// Turf listing projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurfRecord {
    /// Stable turf identifier.
    pub id: TurfId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Turf name, unique within the organization.
    pub name: String,
    /// Sport played on the turf (e.g. `futsal`, `cricket`).
    pub sport: String,
    /// Optional marketing description.
    pub description: Option<String>,
}

/// Input payload for turf creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTurfInput {
    /// Turf name, unique within the organization.
    pub name: String,
    /// Sport played on the turf.
    pub sport: String,
    /// Optional marketing description.
    pub description: Option<String>,
}

/// Repository port for turf persistence.
#[async_trait]
pub trait TurfRepository: Send + Sync {
    /// Persists a turf. The storage layer enforces per-organization name
    /// uniqueness and reports a duplicate as [`AppError::Conflict`].
    async fn insert_turf(
        &self,
        organization_id: OrganizationId,
        input: &CreateTurfInput,
    ) -> AppResult<TurfRecord>;

    /// Lists an organization's turfs.
    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TurfRecord>>;
}

/// Application service for turf listings.
#[derive(Clone)]
pub struct TurfService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn TurfRepository>,
    organization_repository: Arc<dyn OrganizationRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl TurfService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn TurfRepository>,
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

    /// Creates a turf listing for an approved organization.
    pub async fn create_turf(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
        input: CreateTurfInput,
    ) -> AppResult<TurfRecord> {
        self.require_approved_organization(organization_id).await?;
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::ManageTurfs,
                ScopeKey::organization(organization_id.as_uuid()),
            )
            .await?;

        NonEmptyString::new(input.name.as_str())
            .map_err(|_| AppError::Validation("turf name must not be empty".to_owned()))?;
        NonEmptyString::new(input.sport.as_str())
            .map_err(|_| AppError::Validation("sport must not be empty".to_owned()))?;

        let turf = self.repository.insert_turf(organization_id, &input).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::TurfCreated,
                resource_type: "turf".to_owned(),
                resource_id: turf.id.to_string(),
                detail: Some(format!(
                    "created turf '{}' for organization '{organization_id}'",
                    turf.name
                )),
            })
            .await?;

        Ok(turf)
    }

    /// Lists an organization's turfs.
    pub async fn list_turfs(
        &self,
        actor: &UserIdentity,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<TurfRecord>> {
        self.require_approved_organization(organization_id).await?;
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::ViewTurf,
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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchside_core::{AppError, AppResult, UserId, UserIdentity};
    use pitchside_domain::{OrganizationId, OrganizationStatus, Permission, ScopeKey, TurfId};
    use tokio::sync::Mutex;

    use crate::role_service::tests::FakeAuditRepository;
    use crate::{
        AuthorizationRepository, AuthorizationService, OrganizationRecord,
        OrganizationRepository, RegisterOrganizationInput,
    };

    use super::{CreateTurfInput, TurfRecord, TurfRepository, TurfService};

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

    struct FakeOrganizationRepository {
        organizations: Vec<OrganizationRecord>,
    }

    #[async_trait]
    impl OrganizationRepository for FakeOrganizationRepository {
        async fn insert_request(
            &self,
            _input: &RegisterOrganizationInput,
            _requested_by: UserId,
        ) -> AppResult<OrganizationRecord> {
            Err(AppError::Internal("not implemented".to_owned()))
        }

        async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<OrganizationRecord>> {
            Ok(self
                .organizations
                .iter()
                .find(|org| org.id == id)
                .cloned())
        }

        async fn list_by_status(
            &self,
            _status: OrganizationStatus,
        ) -> AppResult<Vec<OrganizationRecord>> {
            Ok(Vec::new())
        }

        async fn transition_status(
            &self,
            _id: OrganizationId,
            _from: OrganizationStatus,
            _to: OrganizationStatus,
        ) -> AppResult<OrganizationRecord> {
            Err(AppError::Internal("not implemented".to_owned()))
        }

        async fn assign_owner(
            &self,
            _id: OrganizationId,
            _owner: UserId,
        ) -> AppResult<OrganizationRecord> {
            Err(AppError::Internal("not implemented".to_owned()))
        }
    }

    #[derive(Default)]
    struct FakeTurfRepository {
        turfs: Mutex<Vec<TurfRecord>>,
    }

    #[async_trait]
    impl TurfRepository for FakeTurfRepository {
        async fn insert_turf(
            &self,
            organization_id: OrganizationId,
            input: &CreateTurfInput,
        ) -> AppResult<TurfRecord> {
            let mut turfs = self.turfs.lock().await;
            let duplicate = turfs
                .iter()
                .any(|turf| turf.organization_id == organization_id && turf.name == input.name);
            if duplicate {
                return Err(AppError::Conflict(format!(
                    "turf '{}' already exists",
                    input.name
                )));
            }

            let turf = TurfRecord {
                id: TurfId::new(),
                organization_id,
                name: input.name.clone(),
                sport: input.sport.clone(),
                description: input.description.clone(),
            };
            turfs.push(turf.clone());
            Ok(turf)
        }

        async fn list_for_organization(
            &self,
            organization_id: OrganizationId,
        ) -> AppResult<Vec<TurfRecord>> {
            Ok(self
                .turfs
                .lock()
                .await
                .iter()
                .filter(|turf| turf.organization_id == organization_id)
                .cloned()
                .collect())
        }
    }

    fn actor(user_id: UserId) -> UserIdentity {
        UserIdentity::new(user_id, "staff", None)
    }

    fn organization(id: OrganizationId, status: OrganizationStatus) -> OrganizationRecord {
        OrganizationRecord {
            id,
            name: "Greenfield Arena".to_owned(),
            description: None,
            status,
            requested_by: UserId::new(),
            owner_user_id: None,
        }
    }

    fn service(
        grants: HashMap<(UserId, ScopeKey), Vec<Permission>>,
        organizations: Vec<OrganizationRecord>,
    ) -> TurfService {
        TurfService::new(
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository { grants })),
            Arc::new(FakeTurfRepository::default()),
            Arc::new(FakeOrganizationRepository { organizations }),
            Arc::new(FakeAuditRepository::default()),
        )
    }

    #[tokio::test]
    async fn create_turf_requires_manage_turfs() {
        let user_id = UserId::new();
        let organization_id = OrganizationId::new();
        let service = service(
            HashMap::new(),
            vec![organization(organization_id, OrganizationStatus::Approved)],
        );

        let result = service
            .create_turf(
                &actor(user_id),
                organization_id,
                CreateTurfInput {
                    name: "Pitch One".to_owned(),
                    sport: "futsal".to_owned(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn create_turf_rejects_unapproved_organization() {
        let user_id = UserId::new();
        let organization_id = OrganizationId::new();
        let service = service(
            HashMap::from([(
                (user_id, ScopeKey::organization(organization_id.as_uuid())),
                vec![Permission::ManageTurfs],
            )]),
            vec![organization(organization_id, OrganizationStatus::Pending)],
        );

        let result = service
            .create_turf(
                &actor(user_id),
                organization_id,
                CreateTurfInput {
                    name: "Pitch One".to_owned(),
                    sport: "futsal".to_owned(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn staff_with_view_permission_can_list() {
        let manager = UserId::new();
        let viewer = UserId::new();
        let organization_id = OrganizationId::new();
        let service = service(
            HashMap::from([
                (
                    (manager, ScopeKey::organization(organization_id.as_uuid())),
                    vec![Permission::ManageTurfs],
                ),
                (
                    (viewer, ScopeKey::organization(organization_id.as_uuid())),
                    vec![Permission::ViewTurf],
                ),
            ]),
            vec![organization(organization_id, OrganizationStatus::Approved)],
        );

        let created = service
            .create_turf(
                &actor(manager),
                organization_id,
                CreateTurfInput {
                    name: "Pitch One".to_owned(),
                    sport: "futsal".to_owned(),
                    description: None,
                },
            )
            .await;
        assert!(created.is_ok());

        let listed = service.list_turfs(&actor(viewer), organization_id).await;
        let Ok(listed) = listed else {
            panic!("listing failed");
        };
        assert_eq!(listed.len(), 1);

        // The manager grant alone does not include the view permission.
        let manager_view = service.list_turfs(&actor(manager), organization_id).await;
        assert!(matches!(manager_view, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn missing_organization_is_not_found() {
        let user_id = UserId::new();
        let service = service(HashMap::new(), Vec::new());

        let result = service
            .list_turfs(&actor(user_id), OrganizationId::new())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
