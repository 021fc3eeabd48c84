//! Torrent client abstraction.
//!
//! The daemon asks a `TorrentClient` for the torrents it should report; each
//! backend maps its own representation onto [`TorrentInfo`].

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
