//! Token signing key

use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use turnstile_core::config::TokenConfig;
use turnstile_core::{Error, Result};

/// Shared HMAC secret used to sign and verify session tokens.
///
/// Never empty: construction fails with
/// [`Error::SigningKeyNotInitialized`] instead.
#[derive(Clone)]
pub struct SigningKey {
    secret: Arc<[u8]>,
}

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::SigningKeyNotInitialized);
        }

        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        match &config.signing_key {
            Some(key) => Self::new(key),
            None => Err(Error::SigningKeyNotInitialized),
        }
    }

    /// Random 256-bit key, hex encoded
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);

        Self {
            secret: Arc::from(hex::encode(bytes).into_bytes()),
        }
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
