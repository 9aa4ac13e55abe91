// handlers/public/auth/register.rs - POST /auth/register/{send,verify}

use axum::{extract::State, Json};
use serde::Deserialize;
use std::collections::HashMap;

use super::{AuthSession, OtpSent, SendOtpRequest};
use crate::auth::{ProfileFields, SessionGrant};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterVerifyRequest {
    pub otp: String,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /auth/register/send - Issue a registration code
///
/// Input: `{"mobile": "9000000000"}`. Fails with `ALREADY_REGISTERED` (409)
/// when the number already has an account.
pub async fn register_send(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<SendOtpRequest>,
) -> ApiResult<OtpSent> {
    let requested = state
        .sessions
        .request_registration(session.0.as_deref(), &body.mobile)
        .await?;
    Ok(ApiResponse::success(requested.into()))
}

/// POST /auth/register/verify - Confirm the code and create the account
///
/// Input: `{"otp": "123456", "name": "A", "surname": "B", "mobile": "9000000000"}`
pub async fn register_verify(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<RegisterVerifyRequest>,
) -> ApiResult<SessionGrant> {
    let mut field_errors = HashMap::new();
    if body.name.trim().is_empty() {
        field_errors.insert("name".to_string(), "This field is required".to_string());
    }
    if body.surname.trim().is_empty() {
        field_errors.insert("surname".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    let session_id = session.resolve(body.session_id)?;
    let grant = state
        .sessions
        .confirm_registration(
            &session_id,
            &body.otp,
            ProfileFields {
                name: body.name,
                surname: body.surname,
                mobile: body.mobile,
            },
        )
        .await?;
    Ok(ApiResponse::created(grant))
}
