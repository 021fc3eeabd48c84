use axum::{
    extract::{Extension, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use rainwatch_core::{Identity, SanitizedConfig};

use crate::metrics::encode_metrics;
use crate::state::AppState;

/// Status answered by `/api/auth` when the shared secret is accepted.
pub const LOGIN_VALIDATED: u16 = 212;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub app: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
    pub license: &'static str,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            app: "rainwatch",
            description: env!("CARGO_PKG_DESCRIPTION"),
            version: env!("CARGO_PKG_VERSION"),
            author: env!("CARGO_PKG_AUTHORS"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

/// GET / and GET|POST /api/info
///
/// Bare service information, no envelope.
pub async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// GET|POST /api/auth
///
/// Reached only once the precheck has passed.
pub async fn auth(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    debug!(user = %identity.user_id, method = %identity.method, "Login validated");
    let status = StatusCode::from_u16(LOGIN_VALIDATED).unwrap_or(StatusCode::OK);
    (status, Json(json!({ "status": "ok" })))
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
