use axum::Json;
use axum::extract::{Extension, State};

use pitchside_core::UserIdentity;
use pitchside_domain::{Permission, ScopeKey};

use crate::dto::GenericMessageResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn admin_dashboard_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<GenericMessageResponse>> {
    state
        .authorization_service
        .require_permission(
            user.user_id(),
            Permission::AccessAdminDashboard,
            ScopeKey::global(),
        )
        .await?;

    Ok(Json(GenericMessageResponse {
        message: format!("welcome to the admin dashboard, {}", user.display_name()),
    }))
}
