use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::handlers::public::auth::AUTH_SESSION_HEADER;
use crate::middleware::device::DEVICE_KEY_HEADER;

/// Thin client over the JSON envelope: returns `data` or fails with the
/// server's `code: error`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    device_key: Option<String>,
    token: Option<String>,
    session: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = url::Url::parse(base_url).with_context(|| format!("invalid server URL: {}", base_url))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            device_key: None,
            token: None,
            session: None,
        })
    }

    pub fn with_device_key(&self, key: String) -> Self {
        Self {
            device_key: Some(key),
            ..self.clone()
        }
    }

    pub fn with_token(&self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    pub fn with_session(&self, session: String) -> Self {
        Self {
            session: Some(session),
            ..self.clone()
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(key) = &self.device_key {
            builder = builder.header(DEVICE_KEY_HEADER, key);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(session) = &self.session {
            builder = builder.header(AUTH_SESSION_HEADER, session);
        }
        builder
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<Value> {
        let response = builder.send().await.context("request failed")?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("unreadable response ({})", status))?;
        unwrap_envelope(status.as_u16(), body)
    }
}

fn unwrap_envelope(status: u16, body: Value) -> anyhow::Result<Value> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    let code = body.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    Err(anyhow!("{} ({}): {}", code, status, message))
}
