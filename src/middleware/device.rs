use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::state::AppState;

pub const DEVICE_KEY_HEADER: &str = "x-device-key";

/// Gate for kitchen tooling: requires the shared device key in `X-Device-Key`.
pub async fn device_key_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = &state.config.security.device_key;
    if expected.is_empty() {
        return Err(ApiError::forbidden("Kitchen access is disabled"));
    }

    let presented = headers
        .get(DEVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing X-Device-Key header"))?;

    if !keys_match(presented, expected) {
        tracing::warn!("Rejected kitchen request with wrong device key");
        return Err(ApiError::forbidden("Invalid device key"));
    }

    Ok(next.run(request).await)
}

/// Compare digests so the check does not short-circuit on the key itself.
fn keys_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
