use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use pitchside_application::{AuthOutcome, RegisterParams};
use pitchside_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{
    AuthLoginRequest, AuthRegisterRequest, BootstrapRequest, GenericMessageResponse,
    RoleAssignmentResponse, UserIdentityResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// POST /auth/register - Create a new account with email+password.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuthRegisterRequest>,
) -> ApiResult<(StatusCode, Json<GenericMessageResponse>)> {
    state
        .user_service
        .register(RegisterParams {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenericMessageResponse {
            message: "account created".to_owned(),
        }),
    ))
}

/// POST /auth/login - Authenticate with email+password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AuthLoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let outcome = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    match outcome {
        AuthOutcome::Authenticated(user) => {
            let identity = UserIdentity::new(user.id, user.display_name, Some(user.email));

            // OWASP Session Management: regenerate session ID on privilege change.
            session.cycle_id().await.map_err(|error| {
                AppError::Internal(format!("failed to cycle session id: {error}"))
            })?;

            session
                .insert(SESSION_USER_KEY, &identity)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist session identity: {error}"))
                })?;

            Ok(Json(UserIdentityResponse::from(identity)))
        }
        AuthOutcome::Failed => {
            // OWASP: generic error message for all failure cases.
            Err(AppError::Unauthorized("invalid email or password".to_owned()).into())
        }
    }
}

/// POST /auth/logout - End the current session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Return the authenticated identity.
pub async fn me_handler(
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    Ok(Json(UserIdentityResponse::from(user)))
}

/// POST /auth/bootstrap - Promote a user to platform administrator.
///
/// Guarded by the deployment bootstrap token rather than a permission check;
/// this is how the first administrator comes to exist.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user = state
        .user_service
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no account for '{}'", payload.email)))?;

    let assignment = state
        .role_assignment_service
        .bootstrap_platform_admin(user.id)
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}
