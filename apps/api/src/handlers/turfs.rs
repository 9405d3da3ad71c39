use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use pitchside_application::{CreateEventInput, CreateTurfInput};
use pitchside_core::UserIdentity;
use pitchside_domain::OrganizationId;

use crate::dto::{CreateEventRequest, CreateTurfRequest, EventResponse, TurfResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_turf_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateTurfRequest>,
) -> ApiResult<(StatusCode, Json<TurfResponse>)> {
    let turf = state
        .turf_service
        .create_turf(
            &user,
            OrganizationId::from_uuid(organization_id),
            CreateTurfInput {
                name: payload.name,
                sport: payload.sport,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TurfResponse::from(turf))))
}

pub async fn list_turfs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TurfResponse>>> {
    let turfs = state
        .turf_service
        .list_turfs(&user, OrganizationId::from_uuid(organization_id))
        .await?
        .into_iter()
        .map(TurfResponse::from)
        .collect();

    Ok(Json(turfs))
}

pub async fn create_event_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventResponse>)> {
    let event = state
        .event_service
        .create_event(
            &user,
            OrganizationId::from_uuid(organization_id),
            CreateEventInput {
                name: payload.name,
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

pub async fn list_events_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(organization_id): Path<Uuid>,
) -> ApiResult<Json<Vec<EventResponse>>> {
    let events = state
        .event_service
        .list_events(&user, OrganizationId::from_uuid(organization_id))
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();

    Ok(Json(events))
}
