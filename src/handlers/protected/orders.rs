use axum::{extract::State, Extension, Json};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::orders::{NewOrder, Order, SavedOrder};
use crate::state::AppState;

/// GET /api/orders - The caller's order history, oldest first
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Order>> {
    let orders = state.orders.get_user_orders(&user.user_id).await?;
    Ok(ApiResponse::success(orders))
}

/// POST /api/orders - Record a paid order and copy it to the caller's history
pub async fn place_my_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(order): Json<NewOrder>,
) -> ApiResult<SavedOrder> {
    let saved = state.orders.save_order(order, Some(&user.user_id)).await?;
    Ok(ApiResponse::created(saved))
}
