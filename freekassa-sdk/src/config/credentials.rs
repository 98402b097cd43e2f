//! Shop credentials.

use std::fmt;

/// Errors raised when credentials are incomplete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("shop id is empty")]
    EmptyShopId,
    #[error("api key is empty")]
    EmptyApiKey,
}

/// Shop identifier plus the secret key requests are signed with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    shop_id: String,
    api_key: Box<[u8]>,
}

impl Credentials {
    /// Create new credentials. Both parts must be non-empty.
    pub fn new(
        shop_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let shop_id = shop_id.into();
        let api_key = api_key.into();
        if shop_id.trim().is_empty() {
            return Err(CredentialsError::EmptyShopId);
        }
        if api_key.is_empty() {
            return Err(CredentialsError::EmptyApiKey);
        }
        Ok(Self {
            shop_id,
            api_key: api_key.into_bytes().into_boxed_slice(),
        })
    }

    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    /// Get the secret key bytes for HMAC signing.
    pub fn api_key(&self) -> &[u8] {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("shop_id", &self.shop_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
