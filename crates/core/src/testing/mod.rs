//! Testing utilities and mock implementations.
//!
//! Mocks for the two seams the rest of the workspace depends on: the torrent
//! backend behind the daemon, and the HTTP transport behind the controllers.
//!
//! # Example
//!
//! ```rust,ignore
//! use rainwatch_core::testing::{fixtures, MockTorrentClient, MockTransport};
//!
//! let backend = MockTorrentClient::new();
//! backend.insert(fixtures::torrent_info("abc123", 100)).await;
//!
//! let transport = MockTransport::new();
//! transport.respond("/api/info", serde_json::json!({"app": "rainwatch"}));
//! ```

mod mock_torrent_client;
mod mock_transport;

pub use mock_torrent_client::MockTorrentClient;
pub use mock_transport::{MockGate, MockTransport};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::torrent_client::{TorrentInfo, TorrentState};

    /// A downloading torrent with reasonable defaults.
    pub fn torrent_info(hash: &str, time_added: i64) -> TorrentInfo {
        TorrentInfo {
            hash: hash.to_string(),
            name: format!("Torrent {}", hash),
            path: format!("/downloads/Torrent {}", hash),
            base_path: "/downloads".to_string(),
            time_added,
            message: String::new(),
            total_size: 100 * 1024 * 1024,
            completed_size: 50 * 1024 * 1024,
            progress: 50.0,
            eta: 50,
            ratio: 0.0,
            uploaded: 0,
            downloaded: 50 * 1024 * 1024,
            upload_rate: 0,
            download_rate: 1024 * 1024,
            connected_peers: 15,
            connected_seeds: 10,
            state: TorrentState::Downloading,
            tracker_host: Some("tracker.example.org".to_string()),
        }
    }

    /// A finished torrent that is still seeding.
    pub fn seeding_info(hash: &str, time_added: i64) -> TorrentInfo {
        TorrentInfo {
            completed_size: 100 * 1024 * 1024,
            downloaded: 100 * 1024 * 1024,
            progress: 100.0,
            eta: 0,
            download_rate: 0,
            upload_rate: 256 * 1024,
            state: TorrentState::Seeding,
            ..torrent_info(hash, time_added)
        }
    }
}
