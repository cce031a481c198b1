//! HMAC signing keys.

use crate::error::{KeyError, KeyResult};
use base64::Engine;
use hmac::{Hmac, Mac};
use rand_core::RngCore;
use sha2::Sha256;
use std::fmt;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Minimum secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Length of generated secrets in bytes.
const GENERATED_SECRET_LEN: usize = 32;

/// A named secret used to sign and verify tokens.
#[derive(Clone)]
pub struct SigningKey {
    name: String,
    secret: Vec<u8>,
    mac: HmacSha256,
}

impl SigningKey {
    /// Build a key from raw secret bytes.
    pub fn from_bytes(name: impl Into<String>, secret: &[u8]) -> KeyResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(KeyError::TooShort {
                len: secret.len(),
                min: MIN_SECRET_LEN,
            });
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| KeyError::KeyParsing(format!("invalid key length: {e}")))?;
        Ok(Self {
            name: name.into(),
            secret: secret.to_vec(),
            mac,
        })
    }

    /// Generate a new random key.
    pub fn generate(name: impl Into<String>) -> KeyResult<Self> {
        let mut secret = [0u8; GENERATED_SECRET_LEN];
        rand_core::OsRng.fill_bytes(&mut secret);
        Self::from_bytes(name, &secret)
    }

    /// Parse from text format: keyname:base64(secret).
    pub fn from_text(s: &str) -> KeyResult<Self> {
        let (name, b64) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| KeyError::KeyParsing("expected 'keyname:base64' format".to_string()))?;

        if name.is_empty() {
            return Err(KeyError::KeyParsing("key name is empty".to_string()));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| KeyError::KeyParsing(format!("invalid base64: {e}")))?;

        Self::from_bytes(name, &bytes)
    }

    /// Encode as text format.
    pub fn to_text(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.secret);
        format!("{}:{b64}", self.name)
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A fresh MAC instance keyed with this secret.
    pub(crate) fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
