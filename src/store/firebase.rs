use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{path_segments, KeyValueStore, StoreError};

/// Firebase Realtime Database over its REST interface.
///
/// Every node is addressable as `{database_url}/{path}.json`; reads of a
/// missing node return a literal `null`.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base: Url,
    auth: Option<String>,
}

impl FirebaseStore {
    pub fn new(database_url: &str, auth: Option<String>) -> Result<Self, StoreError> {
        let mut base = Url::parse(database_url)
            .map_err(|e| StoreError::InvalidPath(format!("{}: {}", database_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base,
            auth,
        })
    }

    fn node_url(&self, path: &str) -> Result<Url, StoreError> {
        let segments = path_segments(path)?;
        let relative = if segments.is_empty() {
            ".json".to_string()
        } else {
            format!("{}.json", segments.join("/"))
        };
        let mut url = self
            .base
            .join(&relative)
            .map_err(|_| StoreError::InvalidPath(path.to_string()))?;
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::SERVICE_UNAVAILABLE || status.is_server_error() {
            return Err(StoreError::Unavailable(format!("{}: {}", status, body)));
        }
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl KeyValueStore for FirebaseStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.node_url(path)?;
        debug!("firebase GET {}", path);
        let response = self.client.get(url).send().await.map_err(transport)?;
        let value: Value = Self::check(response).await?.json().await.map_err(transport)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.node_url(path)?;
        debug!("firebase PUT {}", path);
        let response = self.client.put(url).json(&value).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let url = self.node_url(path)?;
        debug!("firebase DELETE {}", path);
        let response = self.client.delete(url).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut url = self.node_url("")?;
        url.query_pairs_mut().append_pair("shallow", "true");
        let response = self.client.get(url).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}
