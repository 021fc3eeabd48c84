use super::{types::Config, AuthMethod, ConfigError, TorrentClientBackend};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - A non-empty shared key is present when shared_key auth is selected
/// - The selected torrent backend has its section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::SharedKey
        && config.auth.shared_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.shared_key must be set when using shared_key auth".to_string(),
        ));
    }

    if let Some(tc) = &config.torrent_client {
        match tc.backend {
            TorrentClientBackend::QBittorrent if tc.qbittorrent.is_none() => {
                return Err(ConfigError::ValidationError(
                    "torrent_client.qbittorrent section is required for the qbittorrent backend"
                        .to_string(),
                ));
            }
            TorrentClientBackend::QBittorrent => {}
        }
    }

    Ok(())
}
