//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_event_repository;
mod postgres_organization_repository;
mod postgres_permission_catalog_repository;
mod postgres_role_repository;
mod postgres_scope_instance_repository;
mod postgres_turf_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_event_repository::PostgresEventRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_permission_catalog_repository::PostgresPermissionCatalogRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_scope_instance_repository::PostgresScopeInstanceRepository;
pub use postgres_turf_repository::PostgresTurfRepository;
pub use postgres_user_repository::PostgresUserRepository;

/// Postgres SQLSTATE for unique-constraint violations.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Returns whether a sqlx error is a unique-constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some(UNIQUE_VIOLATION);
    }

    false
}
