//! Pitchside API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use pitchside_application::{
    AuthorizationService, EventService, OrganizationService, PermissionCatalogService,
    RoleAssignmentService, RoleService, TurfService, UserService,
};
use pitchside_core::AppError;
use pitchside_infrastructure::{
    Argon2PasswordHasher, PostgresAssignmentRepository, PostgresAuditRepository,
    PostgresAuthorizationRepository, PostgresEventRepository, PostgresOrganizationRepository,
    PostgresPermissionCatalogRepository, PostgresRoleRepository,
    PostgresScopeInstanceRepository, PostgresTurfRepository, PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let bootstrap_token = required_env("AUTH_BOOTSTRAP_TOKEN")?;
    let session_secret = required_env("SESSION_SECRET")?;

    if session_secret.len() < 32 {
        return Err(AppError::Validation(
            "SESSION_SECRET must be at least 32 characters".to_owned(),
        ));
    }

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let scope_instance_repository = Arc::new(PostgresScopeInstanceRepository::new(pool.clone()));
    let organization_repository = Arc::new(PostgresOrganizationRepository::new(pool.clone()));

    let authorization_service = AuthorizationService::new(Arc::new(
        PostgresAuthorizationRepository::new(pool.clone()),
    ));
    let permission_catalog_service = PermissionCatalogService::new(Arc::new(
        PostgresPermissionCatalogRepository::new(pool.clone()),
    ));
    let role_service = RoleService::new(
        authorization_service.clone(),
        Arc::new(PostgresRoleRepository::new(pool.clone())),
        scope_instance_repository.clone(),
        audit_repository.clone(),
    );
    let role_assignment_service = RoleAssignmentService::new(
        role_service.clone(),
        Arc::new(PostgresAssignmentRepository::new(pool.clone())),
        user_repository.clone(),
        audit_repository.clone(),
    );
    let organization_service = OrganizationService::new(
        authorization_service.clone(),
        organization_repository.clone(),
        user_repository.clone(),
        audit_repository.clone(),
    );
    let turf_service = TurfService::new(
        authorization_service.clone(),
        Arc::new(PostgresTurfRepository::new(pool.clone())),
        organization_repository.clone(),
        audit_repository.clone(),
    );
    let event_service = EventService::new(
        authorization_service.clone(),
        Arc::new(PostgresEventRepository::new(pool.clone())),
        organization_repository.clone(),
        audit_repository.clone(),
    );
    let user_service = UserService::new(user_repository, Arc::new(Argon2PasswordHasher::new()));

    let app_state = AppState {
        permission_catalog_service,
        authorization_service,
        role_service,
        role_assignment_service,
        organization_service,
        turf_service,
        event_service,
        user_service,
        frontend_url: frontend_url.clone(),
        bootstrap_token,
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler),
        )
        .route(
            "/api/roles",
            post(handlers::roles::create_global_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            put(handlers::roles::update_role_permissions_handler),
        )
        .route(
            "/api/roles/{role_id}",
            delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/users/{user_id}/global-role",
            post(handlers::assignments::assign_global_role_handler)
                .delete(handlers::assignments::unassign_global_role_handler),
        )
        .route(
            "/api/organizations",
            post(handlers::organizations::register_organization_handler),
        )
        .route(
            "/api/organizations/requests",
            get(handlers::organizations::list_pending_requests_handler),
        )
        .route(
            "/api/organizations/{organization_id}",
            get(handlers::organizations::get_organization_handler),
        )
        .route(
            "/api/organizations/{organization_id}/approve",
            post(handlers::organizations::approve_organization_handler),
        )
        .route(
            "/api/organizations/{organization_id}/reject",
            post(handlers::organizations::reject_organization_handler),
        )
        .route(
            "/api/organizations/{organization_id}/owner",
            post(handlers::organizations::assign_owner_handler),
        )
        .route(
            "/api/organizations/{organization_id}/roles",
            get(handlers::roles::list_organization_roles_handler)
                .post(handlers::roles::create_organization_role_handler),
        )
        .route(
            "/api/organizations/{organization_id}/role-assignments",
            get(handlers::assignments::list_organization_assignments_handler),
        )
        .route(
            "/api/organizations/{organization_id}/users/{user_id}/role",
            post(handlers::assignments::assign_organization_role_handler)
                .delete(handlers::assignments::unassign_organization_role_handler),
        )
        .route(
            "/api/organizations/{organization_id}/turfs",
            get(handlers::turfs::list_turfs_handler).post(handlers::turfs::create_turf_handler),
        )
        .route(
            "/api/organizations/{organization_id}/events",
            get(handlers::turfs::list_events_handler).post(handlers::turfs::create_event_handler),
        )
        .route(
            "/api/events/{event_id}/roles",
            get(handlers::roles::list_event_roles_handler)
                .post(handlers::roles::create_event_role_handler),
        )
        .route(
            "/api/events/{event_id}/role-assignments",
            get(handlers::assignments::list_event_assignments_handler),
        )
        .route(
            "/api/events/{event_id}/users/{user_id}/role",
            post(handlers::assignments::assign_event_role_handler)
                .delete(handlers::assignments::unassign_event_role_handler),
        )
        .route(
            "/api/admin/dashboard",
            get(handlers::admin::admin_dashboard_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "pitchside-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
