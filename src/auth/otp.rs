//! OTP issuance and verification.
//!
//! Per phone key: `NONE -> ISSUED -> (VERIFIED | EXPIRED | LOCKED)`. A wrong
//! code with attempts left stays in `ISSUED`. Expiry is checked before the
//! attempt cap, which is checked before the code comparison. Verifications for
//! the same phone number are serialised.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::otp_store::{OtpRecord, OtpStore};
use super::phone::{legacy_variants, mask, PhoneError, PhoneNumber};
use crate::config::OtpConfig;
use crate::sms::SmsTransport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("No OTP found for this number. Please request a new OTP.")]
    NoOtpSession,

    #[error("OTP has expired. Please request a new one.")]
    Expired,

    #[error("Too many failed attempts. Please request a new OTP.")]
    TooManyAttempts,

    #[error("Invalid OTP. {remaining} attempts remaining.")]
    InvalidCode { remaining: u32 },

    #[error("Invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),
}

#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub ttl: Duration,
    pub max_attempts: u32,
    pub default_country_code: String,
    pub brand: String,
}

impl From<&OtpConfig> for OtpSettings {
    fn from(config: &OtpConfig) -> Self {
        Self {
            ttl: Duration::seconds(config.ttl_secs as i64),
            max_attempts: config.max_attempts,
            default_country_code: config.default_country_code.clone(),
            brand: config.brand.clone(),
        }
    }
}

/// How the code reached (or failed to reach) the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Delivery {
    Sms { message_id: String },
    /// Transport failed; the code is handed back in band so the flow can continue.
    Fallback { code: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct OtpDispatch {
    pub phone: PhoneNumber,
    pub expires_at: DateTime<Utc>,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpStatus {
    pub exists: bool,
    pub attempts: u32,
    pub remaining_secs: i64,
    pub is_expired: bool,
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sms: Arc<dyn SmsTransport>,
    settings: OtpSettings,
    locks: KeyedLocks,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, sms: Arc<dyn SmsTransport>, settings: OtpSettings) -> Self {
        Self {
            store,
            sms,
            settings,
            locks: KeyedLocks::default(),
        }
    }

    pub fn settings(&self) -> &OtpSettings {
        &self.settings
    }

    pub fn parse_phone(&self, raw: &str) -> Result<PhoneNumber, PhoneError> {
        PhoneNumber::parse(raw, &self.settings.default_country_code)
    }

    /// Uniform over 100000..=999999; codes never start with zero.
    pub fn generate_code() -> String {
        rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
    }

    fn message_body(&self, code: &str) -> String {
        format!(
            "Your {} OTP is: {}. Valid for {} minutes. Do not share this code with anyone.",
            self.settings.brand,
            code,
            self.settings.ttl.num_minutes().max(1)
        )
    }

    /// Issue a fresh code for `raw_phone`, replacing any outstanding one.
    ///
    /// SMS failure does not fail the call: the code stays valid and is
    /// returned as [`Delivery::Fallback`].
    pub async fn send_otp(&self, raw_phone: &str) -> Result<OtpDispatch, OtpError> {
        let phone = self.parse_phone(raw_phone)?;
        let key = phone.e164();
        let code = Self::generate_code();
        let expires_at = Utc::now() + self.settings.ttl;

        {
            // Wait out any verify in flight for this number
            let _guard = self.locks.lock(&key).await;
            self.store.put(&key, code.clone(), expires_at).await;
        }
        info!(phone = %phone.masked(), fp = %phone.fingerprint(), "OTP issued");

        let delivery = match self.sms.send(&key, &self.message_body(&code)).await {
            Ok(receipt) => Delivery::Sms {
                message_id: receipt.message_id,
            },
            Err(e) => {
                warn!(phone = %phone.masked(), "SMS delivery failed, using fallback: {}", e);
                Delivery::Fallback {
                    code,
                    reason: "SMS service unavailable, using fallback".to_string(),
                }
            }
        };

        Ok(OtpDispatch {
            phone,
            expires_at,
            delivery,
        })
    }

    /// Check `submitted` against the outstanding code for `raw_phone`.
    pub async fn verify_otp(&self, raw_phone: &str, submitted: &str) -> Result<(), OtpError> {
        let lock_key = self
            .parse_phone(raw_phone)
            .map(|p| p.e164())
            .unwrap_or_else(|_| raw_phone.trim().to_string());
        let _guard = self.locks.lock(&lock_key).await;

        let Some((key, record)) = self.find_record(raw_phone).await else {
            debug!(phone = %mask(raw_phone), "no OTP record under any spelling");
            return Err(OtpError::NoOtpSession);
        };

        if record.is_expired(Utc::now()) {
            self.store.remove(&key).await;
            return Err(OtpError::Expired);
        }

        if record.attempts >= self.settings.max_attempts {
            self.store.remove(&key).await;
            return Err(OtpError::TooManyAttempts);
        }

        if record.code == submitted.trim() {
            self.store.remove(&key).await;
            info!(phone = %mask(&key), "OTP verified");
            return Ok(());
        }

        let attempts = self
            .store
            .touch_failure(&key)
            .await
            .unwrap_or(record.attempts + 1);
        let remaining = self.settings.max_attempts.saturating_sub(attempts);
        warn!(phone = %mask(&key), attempts, remaining, "OTP mismatch");
        Err(OtpError::InvalidCode { remaining })
    }

    /// Canonical key first, then the raw key, then its legacy spellings.
    async fn find_record(&self, raw_phone: &str) -> Option<(String, OtpRecord)> {
        for key in self.candidate_keys(raw_phone) {
            if let Some(record) = self.store.get(&key).await {
                return Some((key, record));
            }
        }
        None
    }

    fn candidate_keys(&self, raw_phone: &str) -> Vec<String> {
        let raw = raw_phone.trim();
        let mut keys = Vec::new();
        if let Ok(phone) = self.parse_phone(raw) {
            keys.push(phone.e164());
        }
        if !raw.is_empty() && !keys.iter().any(|k| k == raw) {
            keys.push(raw.to_string());
        }
        for variant in legacy_variants(raw, &self.settings.default_country_code) {
            if !keys.contains(&variant) {
                keys.push(variant);
            }
        }
        keys
    }

    pub async fn has_pending(&self, raw_phone: &str) -> bool {
        match self.find_record(raw_phone).await {
            Some((_, record)) => !record.is_expired(Utc::now()),
            None => false,
        }
    }

    /// Whole seconds until expiry, rounded up; zero when absent or expired.
    pub async fn remaining_secs(&self, raw_phone: &str) -> i64 {
        match self.find_record(raw_phone).await {
            Some((_, record)) => seconds_left(&record, Utc::now()),
            None => 0,
        }
    }

    pub async fn status(&self, raw_phone: &str) -> OtpStatus {
        let now = Utc::now();
        match self.find_record(raw_phone).await {
            Some((_, record)) => OtpStatus {
                exists: true,
                attempts: record.attempts,
                remaining_secs: seconds_left(&record, now),
                is_expired: record.is_expired(now),
            },
            None => OtpStatus {
                exists: false,
                attempts: 0,
                remaining_secs: 0,
                is_expired: false,
            },
        }
    }

    pub async fn sweep_expired(&self) -> usize {
        self.store.sweep_expired(Utc::now()).await
    }
}

fn seconds_left(record: &OtpRecord, now: DateTime<Utc>) -> i64 {
    let millis = (record.expires_at - now).num_milliseconds().max(0);
    (millis + 999) / 1000
}

/// One async mutex per key, dropped from the map when nobody holds or waits on it.
#[derive(Default)]
struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(key.to_string()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.to_string(),
            _guard: guard,
        }
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // map entry + this guard
        if map.get(&self.key).is_some_and(|m| Arc::strong_count(m) <= 2) {
            map.remove(&self.key);
        }
    }
}
