use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{SmsError, SmsReceipt, SmsTransport};
use crate::auth::phone::mask;

/// Development transport: writes the message to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogSms;

#[async_trait]
impl SmsTransport for LogSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        info!(to = %mask(to), "SMS (log transport): {}", body);
        Ok(SmsReceipt {
            message_id: format!("log-{}", Uuid::new_v4().simple()),
        })
    }

    async fn check(&self) -> Result<String, SmsError> {
        Ok("log".to_string())
    }
}
