use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{path_segments, KeyValueStore, StoreError};

/// In-process JSON tree with the same read/write semantics as the realtime
/// database: writing `null` deletes, and parents left empty are pruned.
#[derive(Clone, Default)]
pub struct MemoryStore {
    root: Arc<RwLock<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Null)),
        }
    }

    /// Full tree snapshot, mostly useful in tests.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(*segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

fn write(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        if rest.is_empty() {
            if value.is_null() {
                map.remove(*head);
            } else {
                map.insert((*head).to_string(), value);
            }
        } else {
            let child = map.entry((*head).to_string()).or_insert(Value::Null);
            write(child, rest, value);
            if child.is_null() || child.as_object().is_some_and(|m| m.is_empty()) {
                map.remove(*head);
            }
        }
        if map.is_empty() {
            *node = Value::Null;
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, &segments).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut root = self.root.write().await;
        write(&mut root, &segments, value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.set(path, Value::Null).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_nested() {
        let store = MemoryStore::new();
        store.set("users/u1", json!({"name": "A"})).await.unwrap();
        store.set("users/u1/lastLogin", json!(42)).await.unwrap();

        assert_eq!(store.get("users/u1/name").await.unwrap(), Some(json!("A")));
        assert_eq!(
            store.get("users/u1").await.unwrap(),
            Some(json!({"name": "A", "lastLogin": 42}))
        );
        assert_eq!(store.get("users/u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_prunes_empty_parents() {
        let store = MemoryStore::new();
        store.set("queue/1", json!({"tableNumber": "5"})).await.unwrap();
        store.remove("queue/1").await.unwrap();

        assert_eq!(store.get("queue").await.unwrap(), None);
        assert_eq!(store.snapshot().await, Value::Null);

        // Removing something that was never there is fine
        store.remove("queue/404").await.unwrap();
    }

    #[tokio::test]
    async fn set_overwrites_whole_node() {
        let store = MemoryStore::new();
        store.set("orders/1", json!({"status": "pending", "total": 10})).await.unwrap();
        store.set("orders/1", json!({"status": "completed"})).await.unwrap();
        assert_eq!(
            store.get("orders/1").await.unwrap(),
            Some(json!({"status": "completed"}))
        );
    }

    #[tokio::test]
    async fn writing_below_a_scalar_replaces_it() {
        let store = MemoryStore::new();
        store.set("users/u1", json!("legacy")).await.unwrap();
        store.set("users/u1/name", json!("B")).await.unwrap();
        assert_eq!(store.get("users/u1").await.unwrap(), Some(json!({"name": "B"})));
    }
}
