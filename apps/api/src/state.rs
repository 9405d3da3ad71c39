use pitchside_application::{
    AuthorizationService, EventService, OrganizationService, PermissionCatalogService,
    RoleAssignmentService, RoleService, TurfService, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_catalog_service: PermissionCatalogService,
    pub authorization_service: AuthorizationService,
    pub role_service: RoleService,
    pub role_assignment_service: RoleAssignmentService,
    pub organization_service: OrganizationService,
    pub turf_service: TurfService,
    pub event_service: EventService,
    pub user_service: UserService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
