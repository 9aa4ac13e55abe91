//! Order recording and the kitchen dispatch queue.
//!
//! Layout in the store:
//! - `orders/{orderId}`: full order
//! - `users/{userId}/orders/{orderId}`: copy for the signed-in customer
//! - `queue/{orderId}`: `{orderNumber, tableNumber, timestamp}` until served

use chrono::{SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{string_or_number, KeyValueStore, StoreError};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    Invalid(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Cart line; extra cart fields (like the menu `id`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Finalised cart as handed over by the checkout callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub table_number: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub order_number: String,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    /// RFC 3339
    pub timestamp: String,
    /// Milliseconds since the epoch
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub order_number: String,
    pub table_number: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOrder {
    pub order_id: String,
    #[serde(flatten)]
    pub entry: QueueEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOrder {
    pub order_id: String,
    pub order_number: String,
}

/// `ORD` followed by the last eight digits of the timestamp.
pub fn order_number_for(timestamp_ms: i64) -> String {
    let digits = timestamp_ms.to_string();
    let tail = &digits[digits.len().saturating_sub(8)..];
    format!("ORD{}", tail)
}

pub struct OrderRecorder {
    store: Arc<dyn KeyValueStore>,
    last_id: AtomicI64,
}

impl OrderRecorder {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            last_id: AtomicI64::new(0),
        }
    }

    /// Millisecond timestamp, bumped so ids never repeat within the process.
    fn next_order_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_id.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last_id
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }

    fn validate(order: &NewOrder) -> Result<(), OrderError> {
        if order.table_number.trim().is_empty() {
            return Err(OrderError::Invalid("table number is required".to_string()));
        }
        if order.items.is_empty() {
            return Err(OrderError::Invalid("order has no items".to_string()));
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity == 0) {
            return Err(OrderError::Invalid(format!("quantity for '{}' must be at least 1", item.name)));
        }
        if order.total.is_sign_negative() {
            return Err(OrderError::Invalid("total cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Record a paid order. The caller's total is stored as given.
    pub async fn save_order(&self, new: NewOrder, user_id: Option<&str>) -> Result<SavedOrder, OrderError> {
        Self::validate(&new)?;

        let id = self.next_order_id();
        let order_id = id.to_string();
        let order_number = new
            .order_number
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| order_number_for(id));
        let timestamp = Utc
            .timestamp_millis_opt(id)
            .single()
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let order = Order {
            order_id: order_id.clone(),
            order_number: order_number.clone(),
            table_number: new.table_number.trim().to_string(),
            items: new.items,
            total: new.total,
            status: OrderStatus::Pending,
            timestamp,
            created_at: id,
            completed_at: None,
        };
        let value = serde_json::to_value(&order).map_err(StoreError::from)?;

        self.store.set(&format!("orders/{}", order_id), value.clone()).await?;

        if let Some(uid) = user_id {
            self.store
                .set(&format!("users/{}/orders/{}", uid, order_id), value)
                .await?;
        }

        let entry = QueueEntry {
            order_number: order_number.clone(),
            table_number: order.table_number.clone(),
            timestamp: id,
        };
        self.store
            .set(
                &format!("queue/{}", order_id),
                serde_json::to_value(&entry).map_err(StoreError::from)?,
            )
            .await?;

        info!(
            order_id = %order_id,
            order_number = %order_number,
            table = %order.table_number,
            "Order saved"
        );
        Ok(SavedOrder {
            order_id,
            order_number,
        })
    }

    async fn collection(&self, path: &str) -> Result<Vec<Order>, OrderError> {
        let mut orders = match self.store.get(path).await? {
            Some(Value::Object(map)) => map
                .into_iter()
                .filter_map(|(id, raw)| match serde_json::from_value::<Order>(raw) {
                    Ok(order) => Some(order),
                    Err(e) => {
                        warn!(order_id = %id, "skipping malformed order: {}", e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Every order, oldest first.
    pub async fn get_all_orders(&self) -> Result<Vec<Order>, OrderError> {
        self.collection("orders").await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>, OrderError> {
        match self.store.get(&format!("orders/{}", order_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw).map_err(StoreError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn get_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.get_all_orders().await?;
        orders.retain(|o| o.status == status);
        Ok(orders)
    }

    pub async fn get_user_orders(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        self.collection(&format!("users/{}/orders", user_id)).await
    }

    /// Set the status; `completed` stamps `completedAt` and leaves the queue.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let mut order = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        self.store
            .set(&format!("orders/{}/status", order_id), json!(status.as_str()))
            .await?;
        order.status = status;

        if status == OrderStatus::Completed {
            let now = Utc::now().timestamp_millis();
            self.store
                .set(&format!("orders/{}/completedAt", order_id), json!(now))
                .await?;
            order.completed_at = Some(now);
            self.remove_from_queue(order_id).await?;
        }

        info!(order_id = %order_id, status = %status, "Order status updated");
        Ok(order)
    }

    pub async fn remove_from_queue(&self, order_id: &str) -> Result<(), OrderError> {
        self.store.remove(&format!("queue/{}", order_id)).await?;
        Ok(())
    }

    /// Oldest queued entry by timestamp, ties broken by id.
    pub async fn next_in_queue(&self) -> Result<Option<QueuedOrder>, OrderError> {
        let queue = match self.store.get("queue").await? {
            Some(Value::Object(map)) => map,
            _ => return Ok(None),
        };

        let next = queue
            .into_iter()
            .filter_map(|(order_id, raw)| {
                serde_json::from_value::<QueueEntry>(raw)
                    .ok()
                    .map(|entry| QueuedOrder { order_id, entry })
            })
            .min_by(|a, b| {
                a.entry
                    .timestamp
                    .cmp(&b.entry.timestamp)
                    .then_with(|| a.order_id.cmp(&b.order_id))
            });
        Ok(next)
    }

    pub async fn complete_order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Completed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cart(table: &str, total: i64) -> NewOrder {
        serde_json::from_value(json!({
            "tableNumber": table,
            "items": [{"id": 1, "name": "X", "price": 100, "quantity": 2}],
            "total": total,
        }))
        .unwrap()
    }

    fn recorder() -> (Arc<MemoryStore>, OrderRecorder) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), OrderRecorder::new(store))
    }

    #[tokio::test]
    async fn save_writes_order_and_queue_entry() {
        let (store, orders) = recorder();
        let saved = orders.save_order(cart("5", 210), None).await.unwrap();

        let order = orders.get_order(&saved.order_id).await.unwrap().unwrap();
        assert_eq!(order.total, Decimal::from(210));
        assert_eq!(order.table_number, "5");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].price, Decimal::from(100));
        assert_eq!(order.items[0].quantity, 2);

        let queued = store
            .get(&format!("queue/{}", saved.order_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(queued["orderNumber"], json!(saved.order_number));
        assert_eq!(queued["tableNumber"], json!("5"));
        assert_eq!(queued["timestamp"], json!(order.created_at));
    }

    #[tokio::test]
    async fn order_number_defaults_to_timestamp_tail() {
        let (_, orders) = recorder();
        let saved = orders.save_order(cart("1", 10), None).await.unwrap();
        assert_eq!(saved.order_number, order_number_for(saved.order_id.parse().unwrap()));
        assert_eq!(order_number_for(1_700_000_123_456), "ORD00123456");
        assert_eq!(order_number_for(42), "ORD42");
    }

    #[tokio::test]
    async fn ids_are_unique_under_burst() {
        let (_, orders) = recorder();
        let mut ids = Vec::new();
        for _ in 0..50 {
            ids.push(orders.save_order(cart("2", 1), None).await.unwrap().order_id);
        }
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn user_copy_is_written_when_signed_in() {
        let (_, orders) = recorder();
        let saved = orders.save_order(cart("3", 5), Some("u1")).await.unwrap();
        let mine = orders.get_user_orders("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order_id, saved.order_id);
        assert!(orders.get_user_orders("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_carts() {
        let (_, orders) = recorder();
        let mut empty = cart("1", 0);
        empty.items.clear();
        assert!(matches!(orders.save_order(empty, None).await, Err(OrderError::Invalid(_))));

        assert!(matches!(
            orders.save_order(cart("  ", 1), None).await,
            Err(OrderError::Invalid(_))
        ));

        let mut zero = cart("1", 1);
        zero.items[0].quantity = 0;
        assert!(matches!(orders.save_order(zero, None).await, Err(OrderError::Invalid(_))));
    }

    #[tokio::test]
    async fn queue_is_served_oldest_first() {
        let (_, orders) = recorder();
        let first = orders.save_order(cart("1", 1), None).await.unwrap();
        let second = orders.save_order(cart("2", 1), None).await.unwrap();

        let next = orders.next_in_queue().await.unwrap().unwrap();
        assert_eq!(next.order_id, first.order_id);

        orders.remove_from_queue(&first.order_id).await.unwrap();
        let next = orders.next_in_queue().await.unwrap().unwrap();
        assert_eq!(next.order_id, second.order_id);

        let done = orders.complete_order(&second.order_id).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert!(done.completed_at.is_some());
        assert!(orders.next_in_queue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_filter_and_missing_orders() {
        let (_, orders) = recorder();
        let a = orders.save_order(cart("1", 1), None).await.unwrap();
        orders.save_order(cart("2", 1), None).await.unwrap();
        orders.update_status(&a.order_id, OrderStatus::Preparing).await.unwrap();

        let preparing = orders.get_orders_by_status(OrderStatus::Preparing).await.unwrap();
        assert_eq!(preparing.len(), 1);
        assert_eq!(preparing[0].order_id, a.order_id);
        assert_eq!(orders.get_all_orders().await.unwrap().len(), 2);

        assert!(matches!(
            orders.update_status("404", OrderStatus::Ready).await,
            Err(OrderError::NotFound(_))
        ));
    }

    #[test]
    fn parses_statuses() {
        assert_eq!("Ready".parse::<OrderStatus>().unwrap(), OrderStatus::Ready);
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
