use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::orders::{Order, OrderStatus, QueuedOrder};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// GET /api/kitchen/orders[?status=pending]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<Order>> {
    let orders = match query.status.as_deref() {
        Some(status) => {
            let status: OrderStatus = status.parse()?;
            state.orders.get_orders_by_status(status).await?
        }
        None => state.orders.get_all_orders().await?,
    };
    Ok(ApiResponse::success(orders))
}

/// GET /api/kitchen/orders/:id
pub async fn show_order(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Order> {
    let order = state
        .orders
        .get_order(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {} not found", id)))?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/kitchen/orders/:id/status - `{"status": "ready"}`
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> ApiResult<Order> {
    let status: OrderStatus = body.status.parse()?;
    let order = state.orders.update_status(&id, status).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/kitchen/orders/:id/complete
pub async fn complete_order(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Order> {
    let order = state.orders.complete_order(&id).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/kitchen/queue/next - Oldest queued order, `null` when empty
pub async fn next_in_queue(State(state): State<AppState>) -> ApiResult<Option<QueuedOrder>> {
    let next = state.orders.next_in_queue().await?;
    Ok(ApiResponse::success(next))
}

/// DELETE /api/kitchen/queue/:id
pub async fn remove_from_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    state.orders.remove_from_queue(&id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "removed": id })))
}
