use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use pitchside_application::AssignRoleInput;
use pitchside_core::{UserId, UserIdentity};
use pitchside_domain::{RoleId, RoleScope};

use crate::dto::{AssignRoleRequest, RoleAssignmentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

async fn assign_role(
    state: &AppState,
    user: &UserIdentity,
    target: Uuid,
    role_id: Uuid,
    scope: RoleScope,
    scope_id: Option<Uuid>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let assignment = state
        .role_assignment_service
        .assign_role(
            user,
            AssignRoleInput {
                user_id: UserId::from_uuid(target),
                role_id: RoleId::from_uuid(role_id),
                scope,
                scope_id,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn assign_global_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(target): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    assign_role(&state, &user, target, payload.role_id, RoleScope::Global, None).await
}

pub async fn unassign_global_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(target): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_assignment_service
        .unassign_role(&user, UserId::from_uuid(target), RoleScope::Global, None)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_organization_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((organization_id, target)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    assign_role(
        &state,
        &user,
        target,
        payload.role_id,
        RoleScope::Organization,
        Some(organization_id),
    )
    .await
}

pub async fn unassign_organization_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((organization_id, target)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .role_assignment_service
        .unassign_role(
            &user,
            UserId::from_uuid(target),
            RoleScope::Organization,
            Some(organization_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_organization_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .role_assignment_service
        .assignments_for_scope_instance(&user, RoleScope::Organization, Some(organization_id))
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_event_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((event_id, target)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    assign_role(
        &state,
        &user,
        target,
        payload.role_id,
        RoleScope::Event,
        Some(event_id),
    )
    .await
}

pub async fn unassign_event_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((event_id, target)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .role_assignment_service
        .unassign_role(
            &user,
            UserId::from_uuid(target),
            RoleScope::Event,
            Some(event_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_event_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .role_assignment_service
        .assignments_for_scope_instance(&user, RoleScope::Event, Some(event_id))
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}
