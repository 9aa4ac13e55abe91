use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{error, info};

use super::{SmsError, SmsReceipt, SmsTransport};

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

/// Twilio Programmable Messaging client.
#[derive(Debug, Clone)]
pub struct TwilioSms {
    options: TwilioOptions,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
}

impl TwilioSms {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn ensure_configured(&self) -> Result<(), SmsError> {
        if self.options.account_sid.is_empty() {
            return Err(SmsError::NotConfigured("TWILIO_ACCOUNT_SID"));
        }
        if self.options.auth_token.is_empty() {
            return Err(SmsError::NotConfigured("TWILIO_AUTH_TOKEN"));
        }
        Ok(())
    }

    fn account_url(&self, suffix: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}{}",
            self.options.api_base.trim_end_matches('/'),
            self.options.account_sid,
            suffix
        )
    }
}

#[async_trait]
impl SmsTransport for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        self.ensure_configured()?;
        if self.options.from_number.is_empty() {
            return Err(SmsError::NotConfigured("TWILIO_FROM_NUMBER"));
        }

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", to);
        form_body.insert("From", &self.options.from_number);
        form_body.insert("Body", body);

        let response = self
            .client
            .post(self.account_url("/Messages.json"))
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Twilio error ({}): {}", status, body);
            return Err(SmsError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let message = response
            .json::<MessageResponse>()
            .await
            .map_err(|e| SmsError::Request(format!("unparseable Twilio response: {}", e)))?;

        info!("SMS accepted by Twilio: {}", message.sid);
        Ok(SmsReceipt {
            message_id: message.sid,
        })
    }

    async fn check(&self) -> Result<String, SmsError> {
        self.ensure_configured()?;

        let response = self
            .client
            .get(self.account_url(".json"))
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .send()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let account = response
            .json::<AccountResponse>()
            .await
            .map_err(|e| SmsError::Request(e.to_string()))?;
        Ok(account.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(sid: &str, token: &str) -> TwilioOptions {
        TwilioOptions {
            account_sid: sid.to_string(),
            auth_token: token.to_string(),
            from_number: "+15005550006".to_string(),
            api_base: "https://api.twilio.com/".to_string(),
        }
    }

    #[test]
    fn builds_account_urls() {
        let sms = TwilioSms::new(options("AC123", "tok"));
        assert_eq!(
            sms.account_url("/Messages.json"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        assert_eq!(
            sms.account_url(".json"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123.json"
        );
    }

    #[tokio::test]
    async fn refuses_to_send_without_credentials() {
        let sms = TwilioSms::new(options("", ""));
        let err = sms.send("+919000000000", "hi").await.unwrap_err();
        assert!(matches!(err, SmsError::NotConfigured("TWILIO_ACCOUNT_SID")));

        let sms = TwilioSms::new(options("AC123", ""));
        let err = sms.check().await.unwrap_err();
        assert!(matches!(err, SmsError::NotConfigured("TWILIO_AUTH_TOKEN")));
    }
}
