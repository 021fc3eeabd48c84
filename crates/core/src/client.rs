//! HTTP request helper used by the view controllers.
//!
//! Every request is a single JSON `POST` carrying the shared secret in the
//! `WWW-Authenticate` header. There is no retry, no timeout and no
//! cancellation: a failed request is logged and dropped.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::envelope::{Delivery, Response};

/// Default daemon address.
pub const DEFAULT_URL: &str = "http://localhost:4464";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Per-client settings; nothing here is global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Daemon base URL.
    pub url: String,
    /// Value sent in the `WWW-Authenticate` header.
    #[serde(default)]
    pub shared_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            shared_key: String::new(),
        }
    }
}

/// Something that can POST JSON to a daemon route and return the parsed body.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn post_json(&self, route: &str, body: &Value) -> Result<Value, ClientError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct RainwatchClient {
    client: Client,
    base_url: String,
}

impl RainwatchClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .default_headers(default_headers(&config.shared_key)?)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Headers sent with every request. An empty key sends no
/// `WWW-Authenticate` header at all, so the daemon reports it as missing.
fn default_headers(shared_key: &str) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !shared_key.is_empty() {
        let key = HeaderValue::from_str(shared_key)
            .map_err(|_| ClientError::Config("shared key contains invalid characters".into()))?;
        headers.insert(WWW_AUTHENTICATE, key);
    }
    Ok(headers)
}

#[async_trait]
impl ApiTransport for RainwatchClient {
    async fn post_json(&self, route: &str, body: &Value) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, route);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Issue one request and unwrap the envelope.
pub async fn request<T>(transport: &T, route: &str, body: &Value) -> Result<Delivery, ClientError>
where
    T: ApiTransport + ?Sized,
{
    let raw = transport.post_json(route, body).await?;
    Ok(Response::from_body(raw).into_delivery())
}

/// Callback-style helper: runs `on_success` with the delivery only when the
/// request succeeds, otherwise logs a diagnostic. Returns whether the
/// callback ran.
pub async fn request_with<T, F>(transport: &T, route: &str, body: &Value, on_success: F) -> bool
where
    T: ApiTransport + ?Sized,
    F: FnOnce(Delivery),
{
    match request(transport, route, body).await {
        Ok(delivery) => {
            on_success(delivery);
            true
        }
        Err(e) => {
            warn!(route, error = %e, "Error retrieving JSON data from server");
            false
        }
    }
}
