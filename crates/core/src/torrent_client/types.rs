//! Types for torrent client operations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// State of a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    Downloading,
    Seeding,
    Paused,
    Checking,
    /// Not started yet or waiting in the queue.
    Queued,
    /// Finished downloading and not seeding.
    Complete,
    Error,
    Unknown,
}

impl TorrentState {
    /// Returns the string representation for API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Queued => "queued",
            TorrentState::Complete => "complete",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// Information about a torrent, as served by `/api/torrent/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    pub name: String,
    /// Full path of the downloaded content.
    #[serde(default)]
    pub path: String,
    /// Directory the content lives in.
    #[serde(default)]
    pub base_path: String,
    /// When the torrent was added, in epoch seconds.
    pub time_added: i64,
    /// Last message from the tracker or client.
    #[serde(default)]
    pub message: String,
    pub total_size: u64,
    pub completed_size: u64,
    /// Percent complete (0 - 100).
    pub progress: f64,
    /// Seconds remaining; 0 when unknown or complete.
    pub eta: u64,
    pub ratio: f64,
    pub uploaded: u64,
    pub downloaded: u64,
    /// Bytes/second.
    pub upload_rate: u64,
    /// Bytes/second.
    pub download_rate: u64,
    pub connected_peers: u32,
    pub connected_seeds: u32,
    pub state: TorrentState,
    /// Tracker hostname without port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_host: Option<String>,
}

/// Filters for listing torrents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TorrentFilter {
    /// Only the torrent with this hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TorrentState>,
}

impl TorrentFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            state: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.state.is_none()
    }

    pub fn matches(&self, info: &TorrentInfo) -> bool {
        self.id
            .as_ref()
            .is_none_or(|id| id.eq_ignore_ascii_case(&info.hash))
            && self.state.is_none_or(|s| s == info.state)
    }
}

/// Torrents keyed by lowercase info hash.
pub type TorrentMap = BTreeMap<String, TorrentInfo>;

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List torrents matching `filter`, keyed by info hash.
    async fn list_torrents(&self, filter: &TorrentFilter) -> Result<TorrentMap, TorrentClientError>;

    /// Get a specific torrent by hash.
    async fn get_torrent(&self, hash: &str) -> Result<TorrentInfo, TorrentClientError> {
        let mut found = self.list_torrents(&TorrentFilter::by_id(hash)).await?;
        found
            .remove(&hash.to_lowercase())
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    /// Move a torrent's data into `dest`, a directory on the backend's host.
    async fn move_torrent(&self, hash: &str, dest: &str) -> Result<(), TorrentClientError>;
}
