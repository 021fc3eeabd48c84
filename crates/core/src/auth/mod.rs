mod none;
mod shared_key;
mod traits;
mod types;

pub use none::*;
pub use shared_key::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::SharedKey => {
            let key = config
                .shared_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "shared_key must be set when using shared_key auth".to_string(),
                    )
                })?;
            Ok(Box::new(SharedKeyAuthenticator::new(key)))
        }
    }
}
