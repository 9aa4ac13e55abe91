// handlers/public/auth/login.rs - POST /auth/login/{send,verify}

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{AuthSession, OtpSent, SendOtpRequest};
use crate::auth::SessionGrant;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginVerifyRequest {
    pub otp: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /auth/login/send - Issue a login code to a registered number
///
/// `NOT_REGISTERED` (404) when the directory has no such user,
/// `DIRECTORY_UNAVAILABLE` (503) when it cannot be read.
pub async fn login_send(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<SendOtpRequest>,
) -> ApiResult<OtpSent> {
    let requested = state
        .sessions
        .request_login(session.0.as_deref(), &body.mobile)
        .await?;
    Ok(ApiResponse::success(requested.into()))
}

/// POST /auth/login/verify - Confirm the code and receive a JWT
pub async fn login_verify(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<LoginVerifyRequest>,
) -> ApiResult<SessionGrant> {
    let session_id = session.resolve(body.session_id)?;
    let grant = state.sessions.confirm_login(&session_id, &body.otp).await?;
    Ok(ApiResponse::success(grant))
}
