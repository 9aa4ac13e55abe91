use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::sms::{SmsError, SmsReceipt, SmsTransport};
use crate::store::{KeyValueStore, StoreError};

/// Transport that keeps every message it was asked to send
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    /// Last `(to, body)` pair
    pub async fn last(&self) -> Option<(String, String)> {
        self.sent.lock().await.last().cloned()
    }

    /// Six digit code from the last message body
    pub async fn last_code(&self) -> Option<String> {
        let (_, body) = self.last().await?;
        extract_code(&body)
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

pub fn extract_code(body: &str) -> Option<String> {
    body.split(|c: char| !c.is_ascii_digit())
        .find(|chunk| chunk.len() == 6)
        .map(str::to_string)
}

#[async_trait]
impl SmsTransport for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), body.to_string()));
        Ok(SmsReceipt {
            message_id: format!("SM{}", sent.len()),
        })
    }

    async fn check(&self) -> Result<String, SmsError> {
        Ok("recording".to_string())
    }
}

/// Transport whose provider is always down
pub struct FailingSms;

#[async_trait]
impl SmsTransport for FailingSms {
    async fn send(&self, _to: &str, _body: &str) -> Result<SmsReceipt, SmsError> {
        Err(SmsError::Request("connection refused".to_string()))
    }

    async fn check(&self) -> Result<String, SmsError> {
        Err(SmsError::Request("connection refused".to_string()))
    }
}

/// Store that fails every operation as unreachable
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _path: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn set(&self, _path: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn remove(&self, _path: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}
