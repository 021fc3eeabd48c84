//! Completion hook and transfer job listing.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use rainwatch_core::{ok_envelope, TransferOptions};

use super::torrents::{backend, params};
use super::ApiError;
use crate::metrics::TRANSFER_JOBS_QUEUED;
use crate::state::AppState;

/// Status answered by `/api/chook` once the job is queued.
pub const QUEUED: u16 = 201;

#[derive(Debug, Default, Deserialize)]
pub struct HookParams {
    pub thash: Option<String>,
    /// `false` or `{"moveto": <dir>}`.
    #[serde(default)]
    pub opts: Value,
}

/// GET|POST|PUT /api/chook
///
/// Called when a torrent completes. Queues a transfer job for `thash`.
pub async fn chook(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HookParams>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let HookParams { thash, opts } = params(query, &body)?;
    let thash = thash
        .filter(|thash| !thash.is_empty())
        .ok_or_else(|| ApiError::missing_params("thash"))?;
    let opts = TransferOptions::from_value(&opts)?;
    // Jobs only run against a backend.
    backend(&state)?;

    let id = state.transfers().enqueue(thash, opts).await;
    TRANSFER_JOBS_QUEUED.inc();

    let status = StatusCode::from_u16(QUEUED).unwrap_or(StatusCode::CREATED);
    Ok((
        status,
        Json(json!({
            "status": "ok",
            "message": format!("Queued as job {}", id),
            "result": { "job": id },
        })),
    ))
}

/// GET|POST /api/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let jobs = state.transfers().jobs().await;
    let result = serde_json::to_value(jobs).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(ok_envelope(result)))
}
