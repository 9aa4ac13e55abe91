use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::config::PaymentConfig;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment gateway key is not configured")]
    NotConfigured,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub color: String,
}

/// Parameters for the hosted checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOptions {
    pub key: String,
    /// Minor currency units (paise for INR)
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    pub theme: Theme,
}

impl CheckoutOptions {
    pub fn for_total(config: &PaymentConfig, total: Decimal) -> Result<Self, PaymentError> {
        Self::for_total_at(config, total, Utc::now().timestamp_millis())
    }

    fn for_total_at(config: &PaymentConfig, total: Decimal, now_ms: i64) -> Result<Self, PaymentError> {
        if config.key_id.is_empty() {
            return Err(PaymentError::NotConfigured);
        }
        if total <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(total.to_string()));
        }

        let amount = (total * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| PaymentError::InvalidAmount(total.to_string()))?;

        Ok(Self {
            key: config.key_id.clone(),
            amount,
            currency: config.currency.clone(),
            name: config.merchant_name.clone(),
            description: format!("{} - Order #{}", config.description, now_ms),
            image: config.image.clone(),
            theme: Theme {
                color: config.theme_color.clone(),
            },
        })
    }
}
