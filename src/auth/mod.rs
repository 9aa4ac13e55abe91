use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SecurityConfig;

pub mod directory;
pub mod otp;
pub mod otp_store;
pub mod phone;
pub mod session;

pub use directory::{DirectoryEntry, Lookup, ProfileUpdate, UserDirectory, UserRecord};
pub use otp::{Delivery, OtpDispatch, OtpError, OtpService, OtpSettings, OtpStatus};
pub use otp_store::{MemoryOtpStore, OtpRecord, OtpStore};
pub use phone::{PhoneError, PhoneNumber};
pub use session::{AuthError, Identity, OtpRequested, ProfileFields, SessionGrant, SessionResolver};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id in the directory
    pub sub: String,
    /// E.164 phone number
    pub phone: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Signs and validates bearer tokens (HS256).
pub struct TokenIssuer {
    secret: String,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry: Duration::hours(expiry_hours as i64),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: &str, phone: &PhoneNumber) -> Result<(String, DateTime<Utc>), JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let now = Utc::now();
        let expires_at = now + self.expiry;
        let claims = Claims {
            sub: user_id.to_string(),
            phone: phone.e164(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))?;

        // Round to the second the token actually carries
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(expires_at);
        Ok((token, expires_at))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

/// Periodically drop expired OTP records and stale pending-auth markers.
pub fn spawn_sweeper(
    otp: Arc<OtpService>,
    sessions: Arc<SessionResolver>,
    interval: StdDuration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let codes = otp.sweep_expired().await;
            let markers = sessions.sweep_stale().await;
            if codes + markers > 0 {
                info!(codes, markers, "Swept expired auth state");
            } else {
                debug!("Auth sweep found nothing to remove");
            }
        }
    })
}
