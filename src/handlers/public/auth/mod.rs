// handlers/public/auth/mod.rs - OTP registration and login
//
// Each flow is two calls: `*/send` issues a code and returns a `session_id`;
// `*/verify` takes the code back together with that session id (header
// `X-Auth-Session` or body field `session_id`) and returns a JWT.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::auth::{AuthError, Delivery, OtpRequested};
use crate::error::ApiError;

pub mod login;
pub mod otp;
pub mod register;

pub use login::{login_send, login_verify};
pub use otp::otp_status;
pub use register::{register_send, register_verify};

pub const AUTH_SESSION_HEADER: &str = "x-auth-session";

/// Client session id from `X-Auth-Session`, if the client sent one
#[derive(Debug, Clone)]
pub struct AuthSession(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(AUTH_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(AuthSession(id))
    }
}

impl AuthSession {
    /// Header wins over the body field; verification needs one of them.
    pub fn resolve(self, body: Option<String>) -> Result<String, ApiError> {
        self.0
            .or(body.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| AuthError::NoPendingAuth.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub mobile: String,
}

#[derive(Debug, Serialize)]
pub struct OtpSent {
    pub message: &'static str,
    #[serde(flatten)]
    pub request: OtpRequested,
}

impl From<OtpRequested> for OtpSent {
    fn from(request: OtpRequested) -> Self {
        let message = match request.delivery {
            Delivery::Sms { .. } => "OTP sent successfully via SMS",
            Delivery::Fallback { .. } => "OTP generated (SMS unavailable, fallback mode)",
        };
        Self { message, request }
    }
}
