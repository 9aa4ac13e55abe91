use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One outstanding code for a phone key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Time-bounded code cache keyed by phone key.
///
/// Backends only store; expiry and attempt policy belong to the verifier.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Create or replace the record for `key` with zero attempts.
    async fn put(&self, key: &str, code: String, expires_at: DateTime<Utc>);

    async fn get(&self, key: &str) -> Option<OtpRecord>;

    /// Increment the attempt counter; returns the new count, `None` if absent.
    async fn touch_failure(&self, key: &str) -> Option<u32>;

    async fn remove(&self, key: &str);

    /// Drop every record expired at `now`; returns how many were removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> usize;
}

/// Process-local store behind an async `RwLock`.
#[derive(Clone, Default)]
pub struct MemoryOtpStore {
    records: Arc<RwLock<HashMap<String, OtpRecord>>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, key: &str, code: String, expires_at: DateTime<Utc>) {
        let mut records = self.records.write().await;
        records.insert(
            key.to_string(),
            OtpRecord {
                code,
                expires_at,
                attempts: 0,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<OtpRecord> {
        let records = self.records.read().await;
        records.get(key).cloned()
    }

    async fn touch_failure(&self, key: &str) -> Option<u32> {
        let mut records = self.records.write().await;
        let record = records.get_mut(key)?;
        record.attempts += 1;
        Some(record.attempts)
    }

    async fn remove(&self, key: &str) {
        let mut records = self.records.write().await;
        records.remove(key);
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }
}
