// handlers/public/checkout.rs - Anonymous checkout
//
// POST /checkout/options - widget parameters for a cart total
// POST /orders           - record a paid order without an account

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::orders::{NewOrder, SavedOrder};
use crate::payment::CheckoutOptions;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

pub async fn checkout_options(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> ApiResult<CheckoutOptions> {
    let options = CheckoutOptions::for_total(&state.config.payment, body.total)?;
    Ok(ApiResponse::success(options))
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(order): Json<NewOrder>,
) -> ApiResult<SavedOrder> {
    let saved = state.orders.save_order(order, None).await?;
    Ok(ApiResponse::created(saved))
}
