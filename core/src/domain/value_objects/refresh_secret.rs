//! Opaque refresh secret handed to clients.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind every secret (256 bits)
pub const REFRESH_SECRET_BYTES: usize = 32;

/// Opaque refresh secret
///
/// Only the SHA-256 digest (`hash()`) is ever persisted. `Debug` output is
/// redacted so secrets cannot leak through log statements.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshSecret(String);

impl RefreshSecret {
    /// Generates a fresh secret from the thread-local CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; REFRESH_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wraps a secret presented by a client
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The plaintext value, to be handed back to the client only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Storage key for this secret
    pub fn hash(&self) -> String {
        hash_secret(&self.0)
    }
}

impl std::fmt::Debug for RefreshSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshSecret(<redacted>)")
    }
}

impl From<String> for RefreshSecret {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for RefreshSecret {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Hashes a secret for storage (SHA-256, lowercase hex)
pub fn hash_secret(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
