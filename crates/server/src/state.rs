use std::sync::Arc;

use rainwatch_core::{Authenticator, Config, SanitizedConfig, TorrentClient, TransferQueue};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    torrent_client: Option<Arc<dyn TorrentClient>>,
    transfers: Arc<TransferQueue>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        torrent_client: Option<Arc<dyn TorrentClient>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            torrent_client,
            transfers: Arc::new(TransferQueue::new()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// The torrent backend, if one is configured.
    pub fn torrent_client(&self) -> Option<&Arc<dyn TorrentClient>> {
        self.torrent_client.as_ref()
    }

    /// Jobs queued through the completion hook.
    pub fn transfers(&self) -> &Arc<TransferQueue> {
        &self.transfers
    }

    /// Start the transfer worker when a backend is configured.
    pub fn start_workers(&self) {
        if let Some(client) = &self.torrent_client {
            self.transfers.start(Arc::clone(client));
        }
    }
}
