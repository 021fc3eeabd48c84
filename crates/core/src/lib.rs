pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod reshape;
pub mod router;
pub mod testing;
pub mod torrent_client;
pub mod transfer;
pub mod view;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
    SharedKeyAuthenticator,
};
pub use client::{request, request_with, ApiTransport, ClientConfig, ClientError, RainwatchClient};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use envelope::{error_envelope, ok_envelope, Delivery, EnvelopeStatus, Response};
pub use reshape::{mk_array, parse_dates, parse_dates_in, sort_records, Record, SortOrder};
pub use router::{resolve, Resolution, Route};
pub use torrent_client::{
    QBittorrentClient, TorrentClient, TorrentClientError, TorrentFilter, TorrentInfo, TorrentMap,
    TorrentState,
};
pub use transfer::{JobState, TransferError, TransferJob, TransferOptions, TransferQueue};
pub use view::{
    Controller, HomeController, Phase, RefreshHandle, RefreshOutcome, TorrentListController, View,
    ViewError, ViewState,
};
