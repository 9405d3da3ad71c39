use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};
use pitchside_domain::RoleScope;
use serde::Deserialize;

use crate::dto::PermissionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PermissionListQuery {
    pub scope: Option<String>,
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let records = match query.scope.as_deref() {
        Some(value) => {
            let scope = RoleScope::from_str(value)?;
            state
                .permission_catalog_service
                .list_by_scope(scope)
                .await?
        }
        None => state.permission_catalog_service.list_all().await?,
    };

    Ok(Json(
        records.into_iter().map(PermissionResponse::from).collect(),
    ))
}
