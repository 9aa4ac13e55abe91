use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub otp: OtpConfig,
    pub sms: SmsConfig,
    pub store: StoreConfig,
    pub security: SecurityConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_secs: u64,
    pub max_attempts: u32,
    pub sweep_interval_secs: u64,
    /// Country code assumed for numbers entered without one (no leading '+').
    pub default_country_code: String,
    /// Brand name used in the SMS message body.
    pub brand: String,
    pub expose_debug_status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmsProvider {
    Twilio,
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub provider: SmsProvider,
    pub account_sid: String,
    #[serde(skip_serializing)]
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreProvider {
    Firebase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub provider: StoreProvider,
    pub database_url: String,
    #[serde(skip_serializing)]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    #[serde(skip_serializing)]
    pub device_key: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub key_id: String,
    pub currency: String,
    pub merchant_name: String,
    pub description: String,
    pub image: String,
    pub theme_color: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    fn with_env_overrides(mut self) -> Self {
        // Server
        if let Some(port) = env::var("CAFE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // OTP overrides
        if let Ok(v) = env::var("OTP_TTL_SECS") {
            self.otp.ttl_secs = v.parse().unwrap_or(self.otp.ttl_secs);
        }
        if let Ok(v) = env::var("OTP_MAX_ATTEMPTS") {
            self.otp.max_attempts = v.parse().unwrap_or(self.otp.max_attempts);
        }
        if let Ok(v) = env::var("OTP_SWEEP_INTERVAL_SECS") {
            self.otp.sweep_interval_secs = v.parse().unwrap_or(self.otp.sweep_interval_secs);
        }
        if let Ok(v) = env::var("OTP_DEFAULT_COUNTRY_CODE") {
            self.otp.default_country_code = v.trim().trim_start_matches('+').to_string();
        }
        if let Ok(v) = env::var("OTP_BRAND") {
            self.otp.brand = v;
        }
        if let Ok(v) = env::var("OTP_EXPOSE_DEBUG_STATUS") {
            self.otp.expose_debug_status = v.parse().unwrap_or(self.otp.expose_debug_status);
        }

        // SMS overrides
        if let Ok(v) = env::var("SMS_PROVIDER") {
            self.sms.provider = match v.as_str() {
                "twilio" => SmsProvider::Twilio,
                "log" => SmsProvider::Log,
                _ => self.sms.provider,
            };
        }
        if let Ok(v) = env::var("TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = v;
        }
        if let Ok(v) = env::var("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = v;
        }
        if let Ok(v) = env::var("TWILIO_FROM_NUMBER") {
            self.sms.from_number = v;
        }
        if let Ok(v) = env::var("TWILIO_API_BASE") {
            self.sms.api_base = v;
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_PROVIDER") {
            self.store.provider = match v.as_str() {
                "firebase" => StoreProvider::Firebase,
                "memory" => StoreProvider::Memory,
                _ => self.store.provider,
            };
        }
        if let Ok(v) = env::var("FIREBASE_DATABASE_URL") {
            self.store.database_url = v;
        }
        if let Ok(v) = env::var("FIREBASE_AUTH") {
            self.store.auth = Some(v).filter(|s| !s.is_empty());
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("DEVICE_KEY") {
            self.security.device_key = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Payment overrides
        if let Ok(v) = env::var("RAZORPAY_KEY_ID") {
            self.payment.key_id = v;
        }
        if let Ok(v) = env::var("PAYMENT_CURRENCY") {
            self.payment.currency = v;
        }
        if let Ok(v) = env::var("PAYMENT_MERCHANT_NAME") {
            self.payment.merchant_name = v;
        }
        if let Ok(v) = env::var("PAYMENT_IMAGE") {
            self.payment.image = v;
        }
        if let Ok(v) = env::var("PAYMENT_THEME_COLOR") {
            self.payment.theme_color = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            otp: OtpConfig {
                ttl_secs: 5 * 60,
                max_attempts: 3,
                sweep_interval_secs: 5 * 60,
                default_country_code: "91".to_string(),
                brand: "Classic Cafe".to_string(),
                expose_debug_status: true,
            },
            sms: SmsConfig {
                provider: SmsProvider::Log,
                account_sid: String::new(),
                auth_token: String::new(),
                from_number: String::new(),
                api_base: "https://api.twilio.com".to_string(),
            },
            store: StoreConfig {
                provider: StoreProvider::Memory,
                database_url: String::new(),
                auth: None,
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                device_key: "dev-device-key".to_string(),
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            payment: PaymentConfig::default_for("rzp_test_key"),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            otp: OtpConfig {
                ttl_secs: 5 * 60,
                max_attempts: 3,
                sweep_interval_secs: 5 * 60,
                default_country_code: "91".to_string(),
                brand: "Classic Cafe".to_string(),
                expose_debug_status: false,
            },
            sms: SmsConfig {
                provider: SmsProvider::Twilio,
                account_sid: String::new(),
                auth_token: String::new(),
                from_number: String::new(),
                api_base: "https://api.twilio.com".to_string(),
            },
            store: StoreConfig {
                provider: StoreProvider::Firebase,
                database_url: String::new(),
                auth: None,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                device_key: String::new(),
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            payment: PaymentConfig::default_for(""),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            otp: OtpConfig {
                ttl_secs: 5 * 60,
                max_attempts: 3,
                sweep_interval_secs: 5 * 60,
                default_country_code: "91".to_string(),
                brand: "Classic Cafe".to_string(),
                expose_debug_status: false,
            },
            sms: SmsConfig {
                provider: SmsProvider::Twilio,
                account_sid: String::new(),
                auth_token: String::new(),
                from_number: String::new(),
                api_base: "https://api.twilio.com".to_string(),
            },
            store: StoreConfig {
                provider: StoreProvider::Firebase,
                database_url: String::new(),
                auth: None,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                device_key: String::new(),
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            payment: PaymentConfig::default_for(""),
        }
    }
}

impl PaymentConfig {
    fn default_for(key_id: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            currency: "INR".to_string(),
            merchant_name: "Classic Cafe".to_string(),
            description: "Food Order Payment".to_string(),
            image: String::new(),
            theme_color: "#F59E0B".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
