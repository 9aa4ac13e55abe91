//! Outbound SMS transports.

use async_trait::async_trait;
use thiserror::Error;

pub mod log;
pub mod twilio;

pub use log::LogSms;
pub use twilio::{TwilioOptions, TwilioSms};

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS transport not configured: {0}")]
    NotConfigured(&'static str),

    #[error("SMS request failed: {0}")]
    Request(String),

    #[error("SMS provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

/// Delivery receipt from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send `body` to `to` (E.164). Transports do not retry.
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError>;

    /// Check provider credentials/connectivity; returns a short status.
    async fn check(&self) -> Result<String, SmsError>;
}
