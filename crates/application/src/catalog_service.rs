use std::sync::Arc;

use async_trait::async_trait;
use pitchside_core::AppResult;
use pitchside_domain::{Permission, RoleScope};

/// Catalog row describing one seeded permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    /// The permission value.
    pub permission: Permission,
    /// Human-readable description from the seeded catalog.
    pub description: Option<String>,
}

/// Repository port for the seeded permission catalog. Read-only.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Lists the whole catalog.
    async fn list_all(&self) -> AppResult<Vec<PermissionRecord>>;

    /// Lists catalog entries applying at one scope.
    async fn list_by_scope(&self, scope: RoleScope) -> AppResult<Vec<PermissionRecord>>;
}

/// Application service exposing the permission catalog.
#[derive(Clone)]
pub struct PermissionCatalogService {
    repository: Arc<dyn PermissionCatalogRepository>,
}

impl PermissionCatalogService {
    /// Creates a new catalog service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionCatalogRepository>) -> Self {
        Self { repository }
    }

    /// Returns every catalog entry.
    pub async fn list_all(&self) -> AppResult<Vec<PermissionRecord>> {
        self.repository.list_all().await
    }

    /// Returns catalog entries for one scope.
    pub async fn list_by_scope(&self, scope: RoleScope) -> AppResult<Vec<PermissionRecord>> {
        self.repository.list_by_scope(scope).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchside_core::AppResult;
    use pitchside_domain::{Permission, RoleScope};

    use super::{PermissionCatalogRepository, PermissionCatalogService, PermissionRecord};

    struct FakeCatalogRepository;

    #[async_trait]
    impl PermissionCatalogRepository for FakeCatalogRepository {
        async fn list_all(&self) -> AppResult<Vec<PermissionRecord>> {
            Ok(Permission::all()
                .iter()
                .map(|permission| PermissionRecord {
                    permission: *permission,
                    description: None,
                })
                .collect())
        }

        async fn list_by_scope(&self, scope: RoleScope) -> AppResult<Vec<PermissionRecord>> {
            Ok(Permission::all_for_scope(scope)
                .into_iter()
                .map(|permission| PermissionRecord {
                    permission,
                    description: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn scoped_listing_only_returns_matching_scope() {
        let service = PermissionCatalogService::new(Arc::new(FakeCatalogRepository));

        let records = service.list_by_scope(RoleScope::Organization).await;
        let Ok(records) = records else {
            panic!("listing failed");
        };
        assert!(!records.is_empty());
        assert!(
            records
                .iter()
                .all(|record| record.permission.scope() == RoleScope::Organization)
        );
    }

    #[tokio::test]
    async fn full_listing_covers_all_scopes() {
        let service = PermissionCatalogService::new(Arc::new(FakeCatalogRepository));

        let records = service.list_all().await;
        let Ok(records) = records else {
            panic!("listing failed");
        };
        assert_eq!(records.len(), Permission::all().len());
    }
}
