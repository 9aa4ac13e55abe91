//! Hierarchical key-value persistence.
//!
//! Paths are slash separated (`users/{id}/orders/{orderId}`). Values are plain
//! JSON; a missing node reads as `None`. Implementations must treat `set` as a
//! full overwrite of the node at `path`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid store payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Connectivity check used by `/health`.
    async fn ping(&self) -> Result<(), StoreError> {
        self.get("").await.map(|_| ())
    }
}

/// Split a path into its non-empty segments, rejecting segments the backing
/// stores cannot address.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        if segment.contains(['.', '#', '$', '[', ']']) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments)
}

/// Field deserializer for stored identifiers that older clients wrote as
/// JSON numbers (mobile numbers, table numbers).
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
