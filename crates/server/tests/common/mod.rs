//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router around a [`MockTorrentClient`], so
//! requests go through the precheck, the handlers and the response layers
//! without a network listener.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use rainwatch_core::{
    testing::MockTorrentClient, AuthConfig, AuthMethod, Authenticator, Config,
    NoneAuthenticator, SharedKeyAuthenticator, TorrentClient, TransferJob,
};

use rainwatch_server::state::AppState;

/// Re-export fixtures for test convenience
pub use rainwatch_core::testing::fixtures;

/// Shared secret configured when a fixture uses shared-key auth.
pub const SHARED_KEY: &str = "test-shared-key";

/// Test fixture for in-process API testing.
pub struct TestFixture {
    pub router: Router,
    pub torrent_client: Arc<MockTorrentClient>,
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub auth: AuthMethod,
    /// Wire the mock backend into the state
    pub with_backend: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            auth: AuthMethod::SharedKey,
            with_backend: true,
        }
    }
}

impl TestConfig {
    pub fn without_auth() -> Self {
        Self {
            auth: AuthMethod::None,
            ..Default::default()
        }
    }

    pub fn without_backend() -> Self {
        Self {
            with_backend: false,
            ..Default::default()
        }
    }
}

impl TestFixture {
    /// Shared-key auth and a mock backend.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let torrent_client = Arc::new(MockTorrentClient::new());

        let (shared_key, authenticator): (Option<String>, Arc<dyn Authenticator>) =
            match test_config.auth {
                AuthMethod::None => (None, Arc::new(NoneAuthenticator::new())),
                AuthMethod::SharedKey => (
                    Some(SHARED_KEY.to_string()),
                    Arc::new(SharedKeyAuthenticator::new(SHARED_KEY)),
                ),
            };

        let config = Config {
            auth: AuthConfig {
                method: test_config.auth,
                shared_key,
            },
            server: Default::default(),
            torrent_client: None,
        };

        let backend = test_config
            .with_backend
            .then(|| Arc::clone(&torrent_client) as Arc<dyn TorrentClient>);

        let state = Arc::new(AppState::new(config, authenticator, backend));
        state.start_workers();
        let router = rainwatch_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            torrent_client,
            state,
        }
    }

    /// Send a GET request without credentials.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path), Body::empty())
            .await
    }

    /// Send a GET request carrying a shared key.
    pub async fn get_with_key(&self, path: &str, key: &str) -> TestResponse {
        let builder = Request::builder()
            .method("GET")
            .uri(path)
            .header("WWW-Authenticate", key);
        self.send(builder, Body::empty()).await
    }

    /// POST a JSON body with the shared key, like the client does.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_with_key(path, body, Some(SHARED_KEY)).await
    }

    /// POST a JSON body with an arbitrary (or no) shared key.
    pub async fn post_with_key(&self, path: &str, body: Value, key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(key) = key {
            builder = builder.header("WWW-Authenticate", key);
        }
        self.send(builder, Body::from(serde_json::to_vec(&body).unwrap()))
            .await
    }

    /// PUT a JSON body with the shared key.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        let builder = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", "application/json")
            .header("WWW-Authenticate", SHARED_KEY);
        self.send(builder, Body::from(serde_json::to_vec(&body).unwrap()))
            .await
    }

    /// Wait until the worker has finished a transfer job.
    pub async fn finished_job(&self, id: u64) -> TransferJob {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(job) = self
                    .state
                    .transfers()
                    .job(id)
                    .await
                    .filter(|job| job.state.is_finished())
                {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("transfer job did not finish")
    }

    /// POST with a raw body and custom content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .header("WWW-Authenticate", SHARED_KEY);
        self.send(builder, Body::from(body.to_string())).await
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
