use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use pitchside_application::CreateRoleInput;
use pitchside_core::UserIdentity;
use pitchside_domain::{Permission, RoleId, RoleScope};

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRolePermissionsRequest};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_permissions(values: &[String]) -> Result<Vec<Permission>, pitchside_core::AppError> {
    values
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect()
}

async fn create_role(
    state: &AppState,
    user: &UserIdentity,
    payload: CreateRoleRequest,
    scope: RoleScope,
    scope_id: Option<Uuid>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .role_service
        .create_role(
            user,
            CreateRoleInput {
                name: payload.name,
                scope,
                scope_id,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn create_global_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    create_role(&state, &user, payload, RoleScope::Global, None).await
}

pub async fn create_organization_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    create_role(
        &state,
        &user,
        payload,
        RoleScope::Organization,
        Some(organization_id),
    )
    .await
}

pub async fn create_event_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    create_role(&state, &user, payload, RoleScope::Event, Some(event_id)).await
}

pub async fn list_organization_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .roles_for_scope_instance(&user, RoleScope::Organization, Some(organization_id))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn list_event_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .roles_for_scope_instance(&user, RoleScope::Event, Some(event_id))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn update_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .role_service
        .update_role_permissions(&user, RoleId::from_uuid(role_id), permissions)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .delete_role(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
