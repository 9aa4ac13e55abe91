#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use cafe_api::auth::MemoryOtpStore;
use cafe_api::config::AppConfig;
use cafe_api::sms::{SmsError, SmsReceipt, SmsTransport};
use cafe_api::store::MemoryStore;
use cafe_api::{app, AppState};

pub const DEVICE_KEY: &str = "dev-device-key";

/// Keeps every outgoing SMS so tests can read the code back
#[derive(Default)]
pub struct CapturingSms {
    sent: Mutex<Vec<(String, String)>>,
    down: bool,
}

impl CapturingSms {
    pub fn offline() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            down: true,
        }
    }
}

#[async_trait]
impl SmsTransport for CapturingSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        if self.down {
            return Err(SmsError::Request("provider offline".to_string()));
        }
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), body.to_string()));
        Ok(SmsReceipt {
            message_id: format!("SMtest{}", sent.len()),
        })
    }

    async fn check(&self) -> Result<String, SmsError> {
        Ok("capturing".to_string())
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub sms: Arc<CapturingSms>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development(), CapturingSms::default()).await
    }

    pub async fn start_with(config: AppConfig, sms: CapturingSms) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryStore::new());
        let sms = Arc::new(sms);
        let state = AppState::new(
            config,
            store.clone(),
            sms.clone(),
            Arc::new(MemoryOtpStore::new()),
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            sms,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Six digit code from the last SMS
    pub async fn last_code(&self) -> Option<String> {
        let sent = self.sms.sent.lock().await;
        let (_, body) = sent.last()?;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|chunk| chunk.len() == 6)
            .map(str::to_string)
    }

    pub async fn post(&self, path: &str, session: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(session) = session {
            req = req.header("X-Auth-Session", session);
        }
        let res = req.send().await?;
        Ok((res.status(), res.json().await?))
    }

    /// Register `mobile` end to end and return the JWT
    pub async fn register(&self, mobile: &str, name: &str) -> Result<String> {
        let (status, sent) = self
            .post("/auth/register/send", None, json!({ "mobile": mobile }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "register send failed: {}", sent);
        let session = sent["data"]["session_id"].as_str().context("no session id")?.to_string();
        let code = self.last_code().await.context("no SMS captured")?;

        let (status, verified) = self
            .post(
                "/auth/register/verify",
                Some(&session),
                json!({ "otp": code, "name": name, "surname": "Tester" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register verify failed: {}", verified);
        Ok(verified["data"]["token"].as_str().context("no token")?.to_string())
    }
}

pub fn cart(table: &str) -> Value {
    json!({
        "tableNumber": table,
        "items": [{ "id": 1, "name": "Masala Chai", "price": 100, "quantity": 2 }],
        "total": 210
    })
}
