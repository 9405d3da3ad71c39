use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::{AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use pitchside_domain::{AuditAction, OrganizationId, OrganizationStatus, Permission, ScopeKey};

use crate::{AuditEvent, AuditRepository, AuthorizationService, UserRepository};

/// Name of the system-managed owner role created per organization.
pub const ORGANIZATION_OWNER_ROLE: &str = "Organization Owner";

/// Organization projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRecord {
    /// Stable organization identifier.
    pub id: OrganizationId,
    /// Unique organization name.
    pub name: String,
    /// Optional marketing description.
    pub description: Option<String>,
    /// Registration review state.
    pub status: OrganizationStatus,
    /// User that submitted the registration request.
    pub requested_by: UserId,
    /// Assigned owner, absent until owner bootstrap runs.
    pub owner_user_id: Option<UserId>,
}

/// Input payload for organization registration requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOrganizationInput {
    /// Unique organization name.
    pub name: String,
    /// Optional marketing description.
    pub description: Option<String>,
}

/// Repository port for organization persistence.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Persists a pending registration request. The storage layer enforces
    /// name uniqueness and reports a duplicate as [`AppError::Conflict`].
    async fn insert_request(
        &self,
        input: &RegisterOrganizationInput,
        requested_by: UserId,
    ) -> AppResult<OrganizationRecord>;

    /// Loads an organization.
    async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<OrganizationRecord>>;

    /// Lists organizations in one review state.
    async fn list_by_status(
        &self,
        status: OrganizationStatus,
    ) -> AppResult<Vec<OrganizationRecord>>;

    /// Transitions the review state with a compare-and-set on the current
    /// status: the update applies only when the stored status equals `from`,
    /// failing with [`AppError::Conflict`] otherwise and
    /// [`AppError::NotFound`] when the row is absent.
    async fn transition_status(
        &self,
        id: OrganizationId,
        from: OrganizationStatus,
        to: OrganizationStatus,
    ) -> AppResult<OrganizationRecord>;

    /// Runs the owner bootstrap as one atomic unit: lock the organization,
    /// fail when absent, not approved, or already owned; find-or-create the
    /// default owner role carrying every organization-scoped permission;
    /// replace any role the user held in the organization; insert the owner
    /// assignment; stamp the owner reference.
    async fn assign_owner(
        &self,
        id: OrganizationId,
        owner: UserId,
    ) -> AppResult<OrganizationRecord>;
}

/// Application service for organization registration and ownership.
#[derive(Clone)]
pub struct OrganizationService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn OrganizationRepository>,
    user_repository: Arc<dyn UserRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl OrganizationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn OrganizationRepository>,
        user_repository: Arc<dyn UserRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            user_repository,
            audit_repository,
        }
    }

    /// Submits an organization registration request on behalf of the actor.
    pub async fn register_organization(
        &self,
        actor: &UserIdentity,
        input: RegisterOrganizationInput,
    ) -> AppResult<OrganizationRecord> {
        NonEmptyString::new(input.name.as_str())
            .map_err(|_| AppError::Validation("organization name must not be empty".to_owned()))?;

        let organization = self
            .repository
            .insert_request(&input, actor.user_id())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::OrganizationRequested,
                resource_type: "organization".to_owned(),
                resource_id: organization.id.to_string(),
                detail: Some(format!(
                    "submitted registration request for '{}'",
                    organization.name
                )),
            })
            .await?;

        Ok(organization)
    }

    /// Lists registration requests awaiting review.
    pub async fn pending_requests(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<OrganizationRecord>> {
        self.require_request_management(actor).await?;

        self.repository
            .list_by_status(OrganizationStatus::Pending)
            .await
    }

    /// Approves a pending registration request.
    pub async fn approve(
        &self,
        actor: &UserIdentity,
        id: OrganizationId,
    ) -> AppResult<OrganizationRecord> {
        self.require_request_management(actor).await?;

        let organization = self
            .repository
            .transition_status(id, OrganizationStatus::Pending, OrganizationStatus::Approved)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::OrganizationApproved,
                resource_type: "organization".to_owned(),
                resource_id: id.to_string(),
                detail: Some(format!("approved organization '{}'", organization.name)),
            })
            .await?;

        Ok(organization)
    }

    /// Rejects a pending registration request.
    pub async fn reject(
        &self,
        actor: &UserIdentity,
        id: OrganizationId,
    ) -> AppResult<OrganizationRecord> {
        self.require_request_management(actor).await?;

        let organization = self
            .repository
            .transition_status(id, OrganizationStatus::Pending, OrganizationStatus::Rejected)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::OrganizationRejected,
                resource_type: "organization".to_owned(),
                resource_id: id.to_string(),
                detail: Some(format!("rejected organization '{}'", organization.name)),
            })
            .await?;

        Ok(organization)
    }

    /// Assigns the owner of an approved organization.
    ///
    /// Materializes (or reuses) the default owner role carrying every
    /// organization-scoped permission and assigns it to the user, replacing
    /// any role they previously held there: owner assignment always wins.
    /// One-time per organization; a second call conflicts.
    pub async fn assign_owner(
        &self,
        actor: &UserIdentity,
        id: OrganizationId,
        owner: UserId,
    ) -> AppResult<OrganizationRecord> {
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::AssignOrganizationOwner,
                ScopeKey::global(),
            )
            .await?;

        if self.user_repository.find_by_id(owner).await?.is_none() {
            return Err(AppError::NotFound(format!("user '{owner}' was not found")));
        }

        let organization = self.repository.assign_owner(id, owner).await?;

        self.audit_repository
            .append_event(AuditEvent {
                actor: actor.user_id(),
                action: AuditAction::OrganizationOwnerAssigned,
                resource_type: "organization".to_owned(),
                resource_id: id.to_string(),
                detail: Some(format!(
                    "assigned user '{owner}' as owner of '{}'",
                    organization.name
                )),
            })
            .await?;

        Ok(organization)
    }

    /// Fetches an organization.
    ///
    /// Approved organizations are visible to any authenticated user; pending
    /// and rejected requests only to request managers.
    pub async fn get(
        &self,
        actor: &UserIdentity,
        id: OrganizationId,
    ) -> AppResult<OrganizationRecord> {
        let organization = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("organization '{id}' was not found")))?;

        if organization.status != OrganizationStatus::Approved {
            self.require_request_management(actor).await?;
        }

        Ok(organization)
    }

    async fn require_request_management(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(
                actor.user_id(),
                Permission::ManageOrganizationRequests,
                ScopeKey::global(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchside_core::{AppError, AppResult, UserId, UserIdentity};
    use pitchside_domain::{OrganizationId, OrganizationStatus, Permission, ScopeKey};
    use tokio::sync::Mutex;

    use crate::{
        AuthorizationRepository, AuthorizationService, UserRecord, UserRepository,
    };
    use crate::role_service::tests::FakeAuditRepository;

    use super::{
        OrganizationRecord, OrganizationRepository, OrganizationService,
        RegisterOrganizationInput,
    };

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

    /// Mirrors the storage transaction semantics of the Postgres adapter:
    /// status compare-and-set, one-time owner stamping.
    #[derive(Default)]
    struct FakeOrganizationRepository {
        organizations: Mutex<Vec<OrganizationRecord>>,
        owner_roles_created: Mutex<Vec<OrganizationId>>,
    }

    #[async_trait]
    impl OrganizationRepository for FakeOrganizationRepository {
        async fn insert_request(
            &self,
            input: &RegisterOrganizationInput,
            requested_by: UserId,
        ) -> AppResult<OrganizationRecord> {
            let mut organizations = self.organizations.lock().await;
            if organizations.iter().any(|org| org.name == input.name) {
                return Err(AppError::Conflict(format!(
                    "organization '{}' already exists",
                    input.name
                )));
            }

            let organization = OrganizationRecord {
                id: OrganizationId::new(),
                name: input.name.clone(),
                description: input.description.clone(),
                status: OrganizationStatus::Pending,
                requested_by,
                owner_user_id: None,
            };
            organizations.push(organization.clone());
            Ok(organization)
        }

        async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<OrganizationRecord>> {
            Ok(self
                .organizations
                .lock()
                .await
                .iter()
                .find(|org| org.id == id)
                .cloned())
        }

        async fn list_by_status(
            &self,
            status: OrganizationStatus,
        ) -> AppResult<Vec<OrganizationRecord>> {
            Ok(self
                .organizations
                .lock()
                .await
                .iter()
                .filter(|org| org.status == status)
                .cloned()
                .collect())
        }

        async fn transition_status(
            &self,
            id: OrganizationId,
            from: OrganizationStatus,
            to: OrganizationStatus,
        ) -> AppResult<OrganizationRecord> {
            let mut organizations = self.organizations.lock().await;
            let organization = organizations
                .iter_mut()
                .find(|org| org.id == id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("organization '{id}' was not found"))
                })?;
            if organization.status != from {
                return Err(AppError::Conflict(format!(
                    "organization '{id}' is not {from}"
                )));
            }
            organization.status = to;
            Ok(organization.clone())
        }

        async fn assign_owner(
            &self,
            id: OrganizationId,
            owner: UserId,
        ) -> AppResult<OrganizationRecord> {
            let mut organizations = self.organizations.lock().await;
            let organization = organizations
                .iter_mut()
                .find(|org| org.id == id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("organization '{id}' was not found"))
                })?;
            if organization.status != OrganizationStatus::Approved {
                return Err(AppError::Conflict(format!(
                    "organization '{id}' is not approved"
                )));
            }
            if organization.owner_user_id.is_some() {
                return Err(AppError::Conflict(format!(
                    "organization '{id}' already has an owner"
                )));
            }
            organization.owner_user_id = Some(owner);
            self.owner_roles_created.lock().await.push(id);
            Ok(organization.clone())
        }
    }

    struct FakeUserRepository {
        users: Vec<UserId>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn find_by_email(&self, _email: &str) -> AppResult<Option<UserRecord>> {
            Ok(None)
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self.users.contains(&user_id).then(|| UserRecord {
                id: user_id,
                email: "owner@example.com".to_owned(),
                display_name: "owner".to_owned(),
                password_hash: "hash".to_owned(),
            }))
        }

        async fn create(
            &self,
            _email: &str,
            _display_name: &str,
            _password_hash: &str,
        ) -> AppResult<UserId> {
            Err(AppError::Internal("not implemented".to_owned()))
        }
    }

    fn actor(user_id: UserId) -> UserIdentity {
        UserIdentity::new(user_id, "actor", None)
    }

    struct Fixture {
        service: OrganizationService,
        repository: Arc<FakeOrganizationRepository>,
        audit_repository: Arc<FakeAuditRepository>,
    }

    fn fixture(
        grants: HashMap<(UserId, ScopeKey), Vec<Permission>>,
        users: Vec<UserId>,
    ) -> Fixture {
        let repository = Arc::new(FakeOrganizationRepository::default());
        let audit_repository = Arc::new(FakeAuditRepository::default());
        let service = OrganizationService::new(
            AuthorizationService::new(Arc::new(FakeAuthorizationRepository { grants })),
            repository.clone(),
            Arc::new(FakeUserRepository { users }),
            audit_repository.clone(),
        );
        Fixture {
            service,
            repository,
            audit_repository,
        }
    }

    fn admin_grants(user_id: UserId) -> HashMap<(UserId, ScopeKey), Vec<Permission>> {
        HashMap::from([(
            (user_id, ScopeKey::global()),
            vec![
                Permission::ManageOrganizationRequests,
                Permission::AssignOrganizationOwner,
            ],
        )])
    }

    async fn seed_request(fixture: &Fixture, requester: UserId, name: &str) -> OrganizationId {
        let organization = fixture
            .service
            .register_organization(
                &actor(requester),
                RegisterOrganizationInput {
                    name: name.to_owned(),
                    description: None,
                },
            )
            .await;
        let Ok(organization) = organization else {
            panic!("seeding organization failed");
        };
        organization.id
    }

    #[tokio::test]
    async fn any_user_may_submit_a_request() {
        let requester = UserId::new();
        let fixture = fixture(HashMap::new(), vec![requester]);

        let result = fixture
            .service
            .register_organization(
                &actor(requester),
                RegisterOrganizationInput {
                    name: "Greenfield Arena".to_owned(),
                    description: Some("five-a-side pitches".to_owned()),
                },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(fixture.audit_repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_organization_name_conflicts() {
        let requester = UserId::new();
        let fixture = fixture(HashMap::new(), vec![requester]);
        seed_request(&fixture, requester, "Greenfield Arena").await;

        let result = fixture
            .service
            .register_organization(
                &actor(requester),
                RegisterOrganizationInput {
                    name: "Greenfield Arena".to_owned(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn listing_requests_requires_admin_permission() {
        let user_id = UserId::new();
        let fixture = fixture(HashMap::new(), vec![user_id]);

        let result = fixture.service.pending_requests(&actor(user_id)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn approve_transitions_pending_to_approved() {
        let admin = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;

        let approved = fixture.service.approve(&actor(admin), id).await;
        let Ok(approved) = approved else {
            panic!("approval failed");
        };
        assert_eq!(approved.status, OrganizationStatus::Approved);
    }

    #[tokio::test]
    async fn approve_twice_conflicts() {
        let admin = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;

        let first = fixture.service.approve(&actor(admin), id).await;
        assert!(first.is_ok());

        let second = fixture.service.approve(&actor(admin), id).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn reject_after_approve_conflicts() {
        let admin = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;

        let approved = fixture.service.approve(&actor(admin), id).await;
        assert!(approved.is_ok());

        let rejected = fixture.service.reject(&actor(admin), id).await;
        assert!(matches!(rejected, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn assign_owner_requires_global_permission() {
        let admin = UserId::new();
        let outsider = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, outsider, requester]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;

        let result = fixture
            .service
            .assign_owner(&actor(outsider), id, requester)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn assign_owner_to_missing_user_is_not_found() {
        let admin = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;
        let approved = fixture.service.approve(&actor(admin), id).await;
        assert!(approved.is_ok());

        let result = fixture
            .service
            .assign_owner(&actor(admin), id, UserId::new())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn assign_owner_is_one_time_per_organization() {
        let admin = UserId::new();
        let requester = UserId::new();
        let other = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester, other]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;
        let approved = fixture.service.approve(&actor(admin), id).await;
        assert!(approved.is_ok());

        let first = fixture
            .service
            .assign_owner(&actor(admin), id, requester)
            .await;
        let Ok(first) = first else {
            panic!("owner assignment failed");
        };
        assert_eq!(first.owner_user_id, Some(requester));

        let second = fixture.service.assign_owner(&actor(admin), id, other).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn each_organization_gets_its_own_owner_role() {
        let admin = UserId::new();
        let requester = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester]);
        let first = seed_request(&fixture, requester, "Greenfield Arena").await;
        let second = seed_request(&fixture, requester, "Riverside Courts").await;
        for id in [first, second] {
            let approved = fixture.service.approve(&actor(admin), id).await;
            assert!(approved.is_ok());
            let owned = fixture.service.assign_owner(&actor(admin), id, requester).await;
            // Same user may own several organizations; scope keys differ.
            assert!(owned.is_ok());
        }

        let created = fixture.repository.owner_roles_created.lock().await;
        assert_eq!(created.len(), 2);
        assert_ne!(created[0], created[1]);
    }

    #[tokio::test]
    async fn pending_organization_is_hidden_from_regular_users() {
        let admin = UserId::new();
        let requester = UserId::new();
        let stranger = UserId::new();
        let fixture = fixture(admin_grants(admin), vec![admin, requester, stranger]);
        let id = seed_request(&fixture, requester, "Greenfield Arena").await;

        let hidden = fixture.service.get(&actor(stranger), id).await;
        assert!(matches!(hidden, Err(AppError::Forbidden(_))));

        let visible_to_admin = fixture.service.get(&actor(admin), id).await;
        assert!(visible_to_admin.is_ok());
    }
}
