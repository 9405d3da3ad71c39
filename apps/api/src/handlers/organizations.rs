use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use pitchside_application::RegisterOrganizationInput;
use pitchside_core::{UserId, UserIdentity};
use pitchside_domain::OrganizationId;

use crate::dto::{AssignOwnerRequest, OrganizationResponse, RegisterOrganizationRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register_organization_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RegisterOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<OrganizationResponse>)> {
    let organization = state
        .organization_service
        .register_organization(
            &user,
            RegisterOrganizationInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse::from(organization)),
    ))
}

pub async fn list_pending_requests_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    let organizations = state
        .organization_service
        .pending_requests(&user)
        .await?
        .into_iter()
        .map(OrganizationResponse::from)
        .collect();

    Ok(Json(organizations))
}

pub async fn approve_organization_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organization_service
        .approve(&user, OrganizationId::from_uuid(organization_id))
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

pub async fn reject_organization_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organization_service
        .reject(&user, OrganizationId::from_uuid(organization_id))
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

pub async fn assign_owner_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<AssignOwnerRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organization_service
        .assign_owner(
            &user,
            OrganizationId::from_uuid(organization_id),
            UserId::from_uuid(payload.user_id),
        )
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

pub async fn get_organization_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state
        .organization_service
        .get(&user, OrganizationId::from_uuid(organization_id))
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}
