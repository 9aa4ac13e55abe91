// handlers/public/auth/otp.rs - GET /auth/otp/:phone (development only)

use axum::extract::{Path, State};
use serde::Serialize;

use crate::auth::{phone::mask, OtpStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OtpDebugStatus {
    pub phone: String,
    pub has_pending: bool,
    #[serde(flatten)]
    pub status: OtpStatus,
}

pub async fn otp_status(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> ApiResult<OtpDebugStatus> {
    if !state.config.otp.expose_debug_status {
        return Err(ApiError::not_found("Not found"));
    }

    Ok(ApiResponse::success(OtpDebugStatus {
        phone: mask(&phone),
        has_pending: state.otp.has_pending(&phone).await,
        status: state.otp.status(&phone).await,
    }))
}
