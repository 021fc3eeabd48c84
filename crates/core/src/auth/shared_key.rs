//! Shared-secret authentication.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{AuthError, AuthRequest, Authenticator, Identity, SHARED_KEY_HEADER};

/// Authenticator that compares the `WWW-Authenticate` header against a
/// static secret from the config file.
///
/// The secret travels in plain text; deployments are expected to sit on a
/// trusted network or behind TLS.
pub struct SharedKeyAuthenticator {
    shared_key: String,
}

impl SharedKeyAuthenticator {
    pub fn new(shared_key: impl Into<String>) -> Self {
        Self {
            shared_key: shared_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for SharedKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = request
            .header(SHARED_KEY_HEADER)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                warn!("Authentication failed; WWW-Authenticate header missing from request");
                AuthError::NotAuthenticated
            })?;

        if constant_time_eq(provided.as_bytes(), self.shared_key.as_bytes()) {
            debug!("Authentication passed");
            Ok(Identity {
                user_id: "shared_key_user".to_string(),
                method: "shared_key".to_string(),
            })
        } else {
            warn!("Authentication failed; invalid credentials");
            Err(AuthError::InvalidCredentials(
                "Authentication failed".to_string(),
            ))
        }
    }

    fn method_name(&self) -> &'static str {
        "shared_key"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
