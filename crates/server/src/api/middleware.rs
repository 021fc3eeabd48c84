//! Precheck, response header and metrics middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use rainwatch_core::{AuthRequest, Identity};

use super::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("rainwatch/", env!("CARGO_PKG_VERSION"));

/// Metrics middleware that tracks HTTP request duration and counts.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Stamp the daemon's identity on a response.
pub async fn server_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    response
}

/// Whether a `Content-Type` announces a JSON body.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.trim_start().to_ascii_lowercase();
            v.starts_with("application/json") || v.starts_with("text/x-json")
        })
        .unwrap_or(false)
}

/// Checks every API request before it reaches a handler.
///
/// A `POST` or `PUT` must carry a JSON content type, and the shared secret must be
/// present in the `WWW-Authenticate` header and match the configured one.
pub async fn precheck_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let has_body = matches!(*request.method(), Method::POST | Method::PUT);
    if has_body && !is_json_content_type(request.headers()) {
        let ctype = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        warn!("Content-Type mismatch. Not acceptable: {:?}", ctype);
        AUTH_FAILURES_TOTAL.with_label_values(&["json_required"]).inc();
        return ApiError::json_required().into_response();
    }

    let authenticator = state.authenticator();

    if authenticator.method_name() == "none" {
        request.extensions_mut().insert(Identity::anonymous());
        return next.run(request).await;
    }

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    match authenticator.authenticate(&AuthRequest { headers }).await {
        Ok(identity) => {
            debug!("Authentication passed");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&[e.code()]).inc();
            ApiError::from(e).into_response()
        }
    }
}
