use anyhow::{bail, Context};
use std::sync::Arc;
use tracing::info;

use crate::auth::{
    MemoryOtpStore, OtpService, OtpSettings, OtpStore, SessionResolver, TokenIssuer, UserDirectory,
};
use crate::config::{AppConfig, SmsProvider, StoreProvider};
use crate::orders::OrderRecorder;
use crate::sms::{LogSms, SmsTransport, TwilioOptions, TwilioSms};
use crate::store::{FirebaseStore, KeyValueStore, MemoryStore};

/// Services shared by every handler, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KeyValueStore>,
    pub sms: Arc<dyn SmsTransport>,
    pub otp: Arc<OtpService>,
    pub directory: Arc<UserDirectory>,
    pub tokens: Arc<TokenIssuer>,
    pub sessions: Arc<SessionResolver>,
    pub orders: Arc<OrderRecorder>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        sms: Arc<dyn SmsTransport>,
        otp_store: Arc<dyn OtpStore>,
    ) -> Self {
        let otp = Arc::new(OtpService::new(
            otp_store,
            sms.clone(),
            OtpSettings::from(&config.otp),
        ));
        let directory = Arc::new(UserDirectory::new(
            store.clone(),
            config.otp.default_country_code.clone(),
        ));
        let tokens = Arc::new(TokenIssuer::from_config(&config.security));
        let sessions = Arc::new(SessionResolver::new(
            otp.clone(),
            directory.clone(),
            tokens.clone(),
        ));
        let orders = Arc::new(OrderRecorder::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            sms,
            otp,
            directory,
            tokens,
            sessions,
            orders,
        }
    }

    /// Build the configured providers. Refuses to start without a JWT secret.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        if config.security.jwt_secret.is_empty() {
            bail!("JWT_SECRET must be set outside development");
        }

        let store: Arc<dyn KeyValueStore> = match config.store.provider {
            StoreProvider::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreProvider::Firebase => {
                let store = FirebaseStore::new(&config.store.database_url, config.store.auth.clone())
                    .context("invalid FIREBASE_DATABASE_URL")?;
                info!(url = %config.store.database_url, "Using Firebase store");
                Arc::new(store)
            }
        };

        let sms: Arc<dyn SmsTransport> = match config.sms.provider {
            SmsProvider::Log => {
                info!("Using log SMS transport; codes are written to the log");
                Arc::new(LogSms)
            }
            SmsProvider::Twilio => Arc::new(TwilioSms::new(TwilioOptions {
                account_sid: config.sms.account_sid.clone(),
                auth_token: config.sms.auth_token.clone(),
                from_number: config.sms.from_number.clone(),
                api_base: config.sms.api_base.clone(),
            })),
        };

        Ok(Self::new(config, store, sms, Arc::new(MemoryOtpStore::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_builds_in_memory_providers() {
        let state = AppState::from_config(AppConfig::development()).unwrap();
        assert!(state.config.is_development());
        assert_eq!(state.otp.settings().max_attempts, 3);
    }

    #[test]
    fn refuses_to_start_without_jwt_secret() {
        let err = AppState::from_config(AppConfig::production()).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn firebase_needs_a_valid_url() {
        let mut config = AppConfig::production();
        config.security.jwt_secret = "s".to_string();
        config.store.database_url = "not a url".to_string();
        assert!(AppState::from_config(config).is_err());

        let mut config = AppConfig::production();
        config.security.jwt_secret = "s".to_string();
        config.store.database_url = "https://cafe-default-rtdb.firebaseio.com".to_string();
        assert!(AppState::from_config(config).is_ok());
    }
}
