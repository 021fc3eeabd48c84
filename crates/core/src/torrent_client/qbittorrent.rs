//! qBittorrent Web API backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{TorrentClient, TorrentClientError, TorrentFilter, TorrentInfo, TorrentMap, TorrentState};

/// Matches a trailing `:port` on a URL authority.
static PORT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r":[0-9]+$").unwrap());

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once the login cookie is in the jar; cleared when it expires.
    session: Arc<RwLock<bool>>,
}

impl QBittorrentClient {
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(false)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and remember that the session cookie is set.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.session.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.session.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Authenticated GET; logs in again once if the session expired.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        self.send(|| self.client.get(&url)).await
    }

    /// Authenticated POST with form data.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        self.send(|| self.client.post(&url).form(params)).await
    }

    async fn send<F>(&self, build: F) -> Result<String, TorrentClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let mut response = build().send().await.map_err(map_send_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.session.write().await = false;
            self.login().await?;
            response = build().send().await.map_err(map_send_error)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }
}

fn map_send_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Row from `/api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    size: i64,
    #[serde(default)]
    completed: i64,
    downloaded: i64,
    uploaded: i64,
    dlspeed: i64,
    upspeed: i64,
    num_seeds: i64,
    num_leechs: i64,
    ratio: f64,
    eta: i64,
    added_on: i64,
    save_path: String,
    #[serde(default)]
    content_path: String,
    #[serde(default)]
    tracker: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        let state = parse_qb_state(&self.state);
        let eta = match state {
            // qBittorrent reports 8640000 for "infinite"
            TorrentState::Downloading if self.eta > 0 && self.eta < 8_640_000 => self.eta as u64,
            _ => 0,
        };

        TorrentInfo {
            hash: self.hash.to_lowercase(),
            path: if self.content_path.is_empty() {
                format!("{}/{}", self.save_path.trim_end_matches('/'), self.name)
            } else {
                self.content_path
            },
            name: self.name,
            base_path: self.save_path,
            time_added: self.added_on,
            message: String::new(),
            total_size: self.size.max(0) as u64,
            completed_size: self.completed.max(0) as u64,
            progress: self.progress * 100.0,
            eta,
            ratio: self.ratio,
            uploaded: self.uploaded.max(0) as u64,
            downloaded: self.downloaded.max(0) as u64,
            upload_rate: self.upspeed.max(0) as u64,
            download_rate: self.dlspeed.max(0) as u64,
            connected_peers: (self.num_seeds.max(0) + self.num_leechs.max(0)) as u32,
            connected_seeds: self.num_seeds.max(0) as u32,
            state,
            tracker_host: tracker_host(&self.tracker),
        }
    }
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" | "allocating" | "stalledDL" => {
            TorrentState::Downloading
        }
        "uploading" | "forcedUP" | "stalledUP" => TorrentState::Seeding,
        "pausedDL" | "stoppedDL" => TorrentState::Paused,
        "pausedUP" | "stoppedUP" => TorrentState::Complete,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

/// Hostname of a tracker URL, without scheme, credentials, path or port.
fn tracker_host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r)?;
    let authority = rest.split(['/', '?']).next().unwrap_or(rest);
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = PORT_SUFFIX.replace(host, "");
    if host.is_empty() {
        None
    } else {
        Some(host.into_owned())
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_torrents(&self, filter: &TorrentFilter) -> Result<TorrentMap, TorrentClientError> {
        let mut endpoint = "/api/v2/torrents/info".to_string();
        if let Some(id) = &filter.id {
            endpoint.push_str(&format!(
                "?hashes={}",
                urlencoding::encode(&id.to_lowercase())
            ));
        }

        let response = self.get(&endpoint).await?;
        let rows: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(rows
            .into_iter()
            .map(QBTorrentInfo::into_torrent_info)
            .filter(|t| filter.matches(t))
            .map(|t| (t.hash.clone(), t))
            .collect())
    }

    async fn move_torrent(&self, hash: &str, dest: &str) -> Result<(), TorrentClientError> {
        let hash = hash.to_lowercase();
        // setLocation answers 200 for unknown hashes too.
        self.get_torrent(&hash).await?;
        self.post_form(
            "/api/v2/torrents/setLocation",
            &[("hashes", &hash), ("location", dest)],
        )
        .await?;
        debug!(%hash, dest, "Requested qBittorrent storage move");
        Ok(())
    }
}
