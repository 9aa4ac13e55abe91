//! Registration and login flows over OTP verification.
//!
//! A client first requests a code (`*_send`), which records a pending-auth
//! marker under a server-issued client session id; the matching `*_verify`
//! consumes that marker. A send may name a session id it was given earlier
//! while that session still has a marker; any other id is replaced. Markers from different client sessions never interfere, and a
//! registration marker never satisfies a login verification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::directory::{Lookup, UserDirectory, UserRecord};
use super::otp::{Delivery, OtpError, OtpService};
use super::phone::{PhoneError, PhoneNumber};
use super::{JwtError, TokenIssuer};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already registered. Please log in instead.")]
    AlreadyRegistered,

    #[error("User not found. Please register first.")]
    NotRegistered,

    #[error("No verification in progress. Please request a new OTP.")]
    NoPendingAuth,

    #[error("User directory is temporarily unavailable. Please try again.")]
    DirectoryUnavailable,

    #[error("Invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    #[error(transparent)]
    Otp(OtpError),

    #[error("Failed to issue session token: {0}")]
    Token(#[from] JwtError),
}

impl From<OtpError> for AuthError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidPhone(e) => AuthError::InvalidPhone(e),
            other => AuthError::Otp(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Registration,
    Login,
}

#[derive(Debug, Clone)]
struct Marker {
    phone: PhoneNumber,
    issued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PendingAuth {
    registration: Option<Marker>,
    login: Option<Marker>,
}

impl PendingAuth {
    fn slot(&mut self, flow: Flow) -> &mut Option<Marker> {
        match flow {
            Flow::Registration => &mut self.registration,
            Flow::Login => &mut self.login,
        }
    }

    fn is_empty(&self) -> bool {
        self.registration.is_none() && self.login.is_none()
    }
}

/// Profile fields collected at registration. `mobile` overrides the marker.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: String,
    pub surname: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpRequested {
    pub session_id: String,
    pub phone: String,
    pub expires_at: DateTime<Utc>,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    pub mobile: String,
    pub phone_number: String,
    pub verified: bool,
    pub created_at: i64,
    pub last_login: i64,
}

impl Identity {
    fn from_record(user_id: String, record: UserRecord) -> Self {
        Self {
            user_id,
            name: record.name,
            surname: record.surname,
            mobile: record.mobile,
            phone_number: record.phone_number,
            verified: true,
            created_at: record.created_at,
            last_login: record.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

pub struct SessionResolver {
    otp: Arc<OtpService>,
    directory: Arc<UserDirectory>,
    tokens: Arc<TokenIssuer>,
    pending: RwLock<HashMap<String, PendingAuth>>,
}

impl SessionResolver {
    pub fn new(otp: Arc<OtpService>, directory: Arc<UserDirectory>, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            otp,
            directory,
            tokens,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Start a registration. Refused when the number is already registered;
    /// an unreadable directory lets registration proceed.
    pub async fn request_registration(
        &self,
        session_id: Option<&str>,
        mobile: &str,
    ) -> Result<OtpRequested, AuthError> {
        let phone = self.otp.parse_phone(mobile)?;
        match self.directory.lookup(&phone).await {
            Lookup::Found(_) => return Err(AuthError::AlreadyRegistered),
            Lookup::NotFound => {}
            Lookup::Unavailable(reason) => {
                warn!(phone = %phone.masked(), "Directory unavailable, registering anyway: {}", reason);
            }
        }
        self.request(Flow::Registration, session_id, mobile).await
    }

    /// Start a login. Requires a directory hit.
    pub async fn request_login(
        &self,
        session_id: Option<&str>,
        mobile: &str,
    ) -> Result<OtpRequested, AuthError> {
        let phone = self.otp.parse_phone(mobile)?;
        match self.directory.lookup(&phone).await {
            Lookup::Found(_) => {}
            Lookup::NotFound => return Err(AuthError::NotRegistered),
            Lookup::Unavailable(_) => return Err(AuthError::DirectoryUnavailable),
        }
        self.request(Flow::Login, session_id, mobile).await
    }

    async fn request(
        &self,
        flow: Flow,
        session_id: Option<&str>,
        mobile: &str,
    ) -> Result<OtpRequested, AuthError> {
        let dispatch = self.otp.send_otp(mobile).await?;

        let mut pending = self.pending.write().await;
        // Only ids this resolver handed out and still tracks are reused
        let session_id = match session_id.map(str::trim) {
            Some(id) if pending.contains_key(id) => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        *pending.entry(session_id.clone()).or_default().slot(flow) = Some(Marker {
            phone: dispatch.phone.clone(),
            issued_at: Utc::now(),
        });

        Ok(OtpRequested {
            session_id,
            phone: dispatch.phone.e164(),
            expires_at: dispatch.expires_at,
            delivery: dispatch.delivery,
        })
    }

    async fn marker(&self, session_id: &str, flow: Flow) -> Result<Marker, AuthError> {
        let mut pending = self.pending.write().await;
        pending
            .get_mut(session_id)
            .and_then(|p| p.slot(flow).clone())
            .ok_or(AuthError::NoPendingAuth)
    }

    async fn clear(&self, session_id: &str, flow: Flow) {
        let mut pending = self.pending.write().await;
        if let Some(entry) = pending.get_mut(session_id) {
            *entry.slot(flow) = None;
            if entry.is_empty() {
                pending.remove(session_id);
            }
        }
    }

    /// Verify the registration code and create the user record.
    ///
    /// The record write is best effort: the caller is authenticated even if
    /// the directory rejects it.
    pub async fn confirm_registration(
        &self,
        session_id: &str,
        code: &str,
        fields: ProfileFields,
    ) -> Result<SessionGrant, AuthError> {
        let marker = self.marker(session_id, Flow::Registration).await?;
        let phone = match fields.mobile.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(mobile) => {
                let phone = self.otp.parse_phone(mobile)?;
                if phone != marker.phone {
                    warn!(
                        marker = %marker.phone.masked(),
                        profile = %phone.masked(),
                        "Registration mobile differs from the number the code was sent to"
                    );
                }
                phone
            }
            None => marker.phone.clone(),
        };

        self.otp.verify_otp(&phone.e164(), code).await?;
        self.clear(session_id, Flow::Registration).await;

        let user_id = Uuid::new_v4().to_string();
        let record = UserRecord::new_verified(
            fields.name.trim().to_string(),
            fields.surname.trim().to_string(),
            &phone,
            Utc::now().timestamp_millis(),
        );
        if let Err(e) = self.directory.create(&user_id, &record).await {
            error!(user_id = %user_id, "Failed to save user profile: {}", e);
        }
        info!(user_id = %user_id, phone = %phone.masked(), "User registered");

        self.grant(user_id, record, &phone)
    }

    /// Verify the login code and re-resolve the user from the directory.
    pub async fn confirm_login(&self, session_id: &str, code: &str) -> Result<SessionGrant, AuthError> {
        let marker = self.marker(session_id, Flow::Login).await?;
        self.otp.verify_otp(&marker.phone.e164(), code).await?;
        // The code is spent whatever the directory says next
        self.clear(session_id, Flow::Login).await;

        let entry = match self.directory.lookup(&marker.phone).await {
            Lookup::Found(entry) => entry,
            Lookup::NotFound => return Err(AuthError::NotRegistered),
            Lookup::Unavailable(_) => return Err(AuthError::DirectoryUnavailable),
        };

        let mut record = entry.record;
        let now = Utc::now().timestamp_millis();
        match self.directory.touch_last_login(&entry.user_id, now).await {
            Ok(()) => record.last_login = now,
            Err(e) => warn!(user_id = %entry.user_id, "Failed to update lastLogin: {}", e),
        }
        info!(user_id = %entry.user_id, phone = %marker.phone.masked(), "User logged in");

        self.grant(entry.user_id, record, &marker.phone)
    }

    fn grant(&self, user_id: String, record: UserRecord, phone: &PhoneNumber) -> Result<SessionGrant, AuthError> {
        let (token, expires_at) = self.tokens.issue(&user_id, phone)?;
        Ok(SessionGrant {
            token,
            expires_at,
            user: Identity::from_record(user_id, record),
        })
    }

    /// Drop markers older than the code lifetime.
    pub async fn sweep_stale(&self) -> usize {
        let cutoff = Utc::now() - self.otp.settings().ttl;
        let mut pending = self.pending.write().await;
        let mut removed = 0;
        for entry in pending.values_mut() {
            for flow in [Flow::Registration, Flow::Login] {
                let slot = entry.slot(flow);
                if slot.as_ref().is_some_and(|m| m.issued_at < cutoff) {
                    *slot = None;
                    removed += 1;
                }
            }
        }
        pending.retain(|_, entry| !entry.is_empty());
        removed
    }

    pub async fn pending_sessions(&self) -> usize {
        self.pending.read().await.len()
    }
}
