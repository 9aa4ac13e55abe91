use axum::{extract::State, Extension};
use serde::Serialize;

use crate::auth::UserRecord;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: String,
    pub phone: String,
    /// `None` when the directory has no record (registration write failed)
    pub profile: Option<UserRecord>,
}

/// GET /api/auth/whoami - Current caller from the token plus their stored profile
pub async fn whoami(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<WhoAmI> {
    let profile = state.directory.get_profile(&user.user_id).await?;
    Ok(ApiResponse::success(WhoAmI {
        user_id: user.user_id,
        phone: user.phone,
        profile,
    }))
}
