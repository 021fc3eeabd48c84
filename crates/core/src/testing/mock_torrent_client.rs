//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    TorrentClient, TorrentClientError, TorrentFilter, TorrentInfo, TorrentMap,
};

/// In-memory implementation of the TorrentClient trait.
///
/// - Pre-populate torrents with [`MockTorrentClient::insert`]
/// - Make the next call fail with [`MockTorrentClient::fail_next`]
/// - Count list calls and record storage moves for assertions
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    torrents: Arc<RwLock<BTreeMap<String, TorrentInfo>>>,
    /// If set, the next operation fails with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    list_calls: Arc<RwLock<usize>>,
    moves: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockTorrentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a torrent, keyed by its lowercase hash.
    pub async fn insert(&self, info: TorrentInfo) {
        self.torrents
            .write()
            .await
            .insert(info.hash.to_lowercase(), info);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn fail_next(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of `list_torrents` calls made so far.
    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }

    /// `(hash, dest)` of every successful `move_torrent`, in call order.
    pub async fn moves(&self) -> Vec<(String, String)> {
        self.moves.read().await.clone()
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_torrents(&self, filter: &TorrentFilter) -> Result<TorrentMap, TorrentClientError> {
        *self.list_calls.write().await += 1;
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self
            .torrents
            .read()
            .await
            .iter()
            .filter(|(_, info)| filter.matches(info))
            .map(|(hash, info)| (hash.clone(), info.clone()))
            .collect())
    }

    async fn move_torrent(&self, hash: &str, dest: &str) -> Result<(), TorrentClientError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let hash = hash.to_lowercase();
        let mut torrents = self.torrents.write().await;
        let info = torrents
            .get_mut(&hash)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.clone()))?;
        info.base_path = dest.to_string();
        info.path = format!("{}/{}", dest.trim_end_matches('/'), info.name);

        self.moves.write().await.push((hash, dest.to_string()));
        Ok(())
    }
}
