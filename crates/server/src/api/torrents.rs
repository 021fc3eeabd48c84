//! Torrent API handlers.
//!
//! Every route answers with the success envelope wrapping a mapping of
//! lowercase info hash to torrent record.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use rainwatch_core::{ok_envelope, TorrentClient, TorrentFilter, TorrentInfo, TorrentMap};

use super::ApiError;
use crate::metrics::{BACKEND_REQUESTS_TOTAL, TORRENTS_BY_STATE, TORRENTS_LISTED};
use crate::state::AppState;

/// Parameters come from the JSON body when there is one, else from the query string.
pub(crate) fn params<T>(query: Result<Query<T>, QueryRejection>, body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    if !body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(body).map_err(ApiError::invalid_json);
    }
    query
        .map(|Query(query)| query)
        .map_err(|rejection| ApiError::invalid_params(rejection.body_text()))
}

pub(crate) fn backend(state: &AppState) -> Result<&Arc<dyn TorrentClient>, ApiError> {
    state.torrent_client().ok_or_else(ApiError::backend_unavailable)
}

fn respond(torrents: &TorrentMap) -> Result<Json<Value>, ApiError> {
    let result = serde_json::to_value(torrents).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(ok_envelope(result)))
}

fn single(info: TorrentInfo) -> TorrentMap {
    let mut torrents = TorrentMap::new();
    torrents.insert(info.hash.to_lowercase(), info);
    torrents
}

fn record_listing(torrents: &TorrentMap) {
    TORRENTS_LISTED.set(torrents.len() as i64);
    let mut by_state: BTreeMap<&str, i64> = BTreeMap::new();
    for info in torrents.values() {
        *by_state.entry(info.state.as_str()).or_default() += 1;
    }
    TORRENTS_BY_STATE.reset();
    for (state, count) in by_state {
        TORRENTS_BY_STATE.with_label_values(&[state]).set(count);
    }
}

/// GET|POST /api/torrent/list
///
/// Accepts an optional `{"state": ...}` filter.
pub async fn list_torrents(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TorrentFilter>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let filter: TorrentFilter = params(query, &body)?;
    let client = backend(&state)?;

    match client.list_torrents(&filter).await {
        Ok(torrents) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["list", "ok"]).inc();
            if filter.is_empty() {
                record_listing(&torrents);
            }
            debug!(backend = client.name(), count = torrents.len(), "Listed torrents");
            respond(&torrents)
        }
        Err(e) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["list", "error"]).inc();
            warn!(backend = client.name(), error = %e, "Failed to list torrents");
            Err(e.into())
        }
    }
}

/// GET|POST /api/torrent/getinfo
///
/// Requires `{"id": <info hash>}`.
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TorrentFilter>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let filter: TorrentFilter = params(query, &body)?;
    let id = filter
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::missing_params("id"))?;
    let client = backend(&state)?;

    match client.get_torrent(&id).await {
        Ok(info) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["get", "ok"]).inc();
            respond(&single(info))
        }
        Err(e) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["get", "error"]).inc();
            debug!(backend = client.name(), %id, error = %e, "Torrent lookup failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MoveParams {
    pub id: Option<String>,
    /// Destination directory on the backend's host.
    pub dest: Option<String>,
}

/// GET|POST /api/torrent/move
///
/// Requires `{"id": <info hash>, "dest": <directory>}`; answers with the
/// moved torrent.
pub async fn move_torrent(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MoveParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let MoveParams { id, dest } = params(query, &body)?;
    let id = id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::missing_params("id"))?;
    let dest = dest
        .filter(|dest| !dest.is_empty())
        .ok_or_else(|| ApiError::missing_params("dest"))?;
    let client = backend(&state)?;

    let moved = match client.move_torrent(&id, &dest).await {
        Ok(()) => client.get_torrent(&id).await,
        Err(e) => Err(e),
    };

    match moved {
        Ok(info) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["move", "ok"]).inc();
            info!(backend = client.name(), %id, %dest, "Moved torrent storage");
            respond(&single(info))
        }
        Err(e) => {
            BACKEND_REQUESTS_TOTAL.with_label_values(&["move", "error"]).inc();
            warn!(backend = client.name(), %id, %dest, error = %e, "Failed to move torrent");
            Err(e.into())
        }
    }
}
