use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The `WWW-Authenticate` header was not sent.
    #[error("Must include WWW-Authenticate header")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// Machine-readable error code used in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "www_authenticate_header_missing",
            AuthError::InvalidCredentials(_) => "auth_fail",
            AuthError::ConfigurationError(_) => "auth_misconfigured",
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
