use axum::{extract::State, Extension, Json};

use crate::auth::{ProfileUpdate, UserRecord};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /api/profile
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserRecord> {
    let profile = state
        .directory
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile - Update name and/or surname
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<UserRecord> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&update.name) || blank(&update.surname) {
        return Err(ApiError::validation_error("Name fields cannot be empty", None));
    }

    let profile = state
        .directory
        .update_profile(&user.user_id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(ApiResponse::success(profile))
}
