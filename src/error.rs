// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{AuthError, JwtError, OtpError};
use crate::orders::OrderError;
use crate::payment::PaymentError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    /// Failure with a stable code the client branches on (OTP and auth flow)
    Domain {
        status: u16,
        code: &'static str,
        message: String,
        remaining_attempts: Option<u32>,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Domain { status, .. } => *status,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Domain { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Domain { code, .. } => code,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::Domain {
                remaining_attempts: Some(remaining),
                ..
            } => {
                response["remaining_attempts"] = json!(remaining);
            }
            _ => {}
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    fn domain(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Domain {
            status,
            code,
            message: message.into(),
            remaining_attempts: None,
        }
    }
}

// Convert domain error types to ApiError
impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        let message = err.to_string();
        match err {
            OtpError::NoOtpSession => ApiError::domain(400, "NO_OTP_SESSION", message),
            OtpError::Expired => ApiError::domain(410, "OTP_EXPIRED", message),
            OtpError::TooManyAttempts => ApiError::domain(429, "TOO_MANY_ATTEMPTS", message),
            OtpError::InvalidCode { remaining } => ApiError::Domain {
                status: 401,
                code: "INVALID_CODE",
                message,
                remaining_attempts: Some(remaining),
            },
            OtpError::InvalidPhone(_) => ApiError::domain(400, "INVALID_PHONE", message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::AlreadyRegistered => ApiError::domain(409, "ALREADY_REGISTERED", message),
            AuthError::NotRegistered => ApiError::domain(404, "NOT_REGISTERED", message),
            AuthError::NoPendingAuth => ApiError::domain(400, "NO_PENDING_AUTH", message),
            AuthError::DirectoryUnavailable => {
                ApiError::domain(503, "DIRECTORY_UNAVAILABLE", message)
            }
            AuthError::InvalidPhone(_) => ApiError::domain(400, "INVALID_PHONE", message),
            AuthError::Otp(otp) => otp.into(),
            AuthError::Token(jwt) => jwt.into(),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(msg) => ApiError::unauthorized(format!("Invalid JWT token: {}", msg)),
            other => {
                tracing::error!("Token error: {}", other);
                ApiError::internal_server_error("Failed to issue session token")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath(path) => ApiError::bad_request(format!("Invalid identifier: {}", path)),
            StoreError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Data store temporarily unavailable")
            }
            other => {
                // Don't expose backend responses to clients
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Invalid(msg) => ApiError::validation_error(msg, None),
            OrderError::UnknownStatus(status) => {
                let mut field_errors = HashMap::new();
                field_errors.insert(
                    "status".to_string(),
                    "Expected one of: pending, preparing, ready, completed, cancelled".to_string(),
                );
                ApiError::validation_error(format!("Unknown order status: {}", status), Some(field_errors))
            }
            OrderError::NotFound(id) => ApiError::not_found(format!("Order {} not found", id)),
            OrderError::Store(e) => e.into(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => {
                tracing::error!("Payment key is not configured");
                ApiError::service_unavailable("Payments are not available")
            }
            PaymentError::InvalidAmount(_) => ApiError::validation_error(err.to_string(), None),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_code_carries_remaining_attempts() {
        let err = ApiError::from(OtpError::InvalidCode { remaining: 2 });
        assert_eq!(err.status_code(), 401);
        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("INVALID_CODE"));
        assert_eq!(body["remaining_attempts"], json!(2));
        assert_eq!(body["error"], json!("Invalid OTP. 2 attempts remaining."));
    }

    #[test]
    fn otp_errors_inside_auth_errors_keep_their_codes() {
        let err = ApiError::from(AuthError::Otp(OtpError::Expired));
        assert_eq!(err.status_code(), 410);
        assert_eq!(err.error_code(), "OTP_EXPIRED");

        let err = ApiError::from(AuthError::Otp(OtpError::TooManyAttempts));
        assert_eq!(err.error_code(), "TOO_MANY_ATTEMPTS");
    }

    #[test]
    fn store_details_are_not_leaked() {
        let err = ApiError::from(StoreError::Rejected {
            status: 401,
            body: "Permission denied".to_string(),
        });
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("Permission"));
    }
}
