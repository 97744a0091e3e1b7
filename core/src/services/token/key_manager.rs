//! Signing key material for access credentials
//!
//! Keys are loaded once at start-up. One key signs; every key in the set
//! (including the signing key) verifies, so credentials minted before a key
//! rotation stay valid until they expire.

use std::fs;
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use wl_shared::config::{JwtConfig, VerificationKeyConfig};

use crate::errors::TokenError;

/// A key accepted when verifying credentials
#[derive(Clone)]
pub struct VerificationKey {
    kid: String,
    algorithm: Algorithm,
    decoding_key: DecodingKey,
}

impl VerificationKey {
    /// Shared-secret key
    pub fn hs256(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            kid: kid.into(),
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// RSA public key in PEM format
    pub fn rs256_from_pem(kid: impl Into<String>, public_key_pem: &[u8]) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem).map_err(|e| TokenError::KeyLoad {
            message: format!("Invalid public key format: {}", e),
        })?;
        Ok(Self {
            kid: kid.into(),
            algorithm: Algorithm::RS256,
            decoding_key,
        })
    }

    /// RSA public key read from a PEM file
    pub fn rs256_from_file<P: AsRef<Path>>(kid: impl Into<String>, path: P) -> Result<Self, TokenError> {
        let pem = read_pem(path.as_ref(), "public")?;
        Self::rs256_from_pem(kid, &pem)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Active signing key plus every key currently accepted for verification
#[derive(Clone)]
pub struct SigningKeys {
    kid: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    verification_keys: Vec<VerificationKey>,
}

impl SigningKeys {
    /// HS256 key set from a shared secret
    pub fn hs256(kid: impl Into<String>, secret: &[u8]) -> Self {
        let kid = kid.into();
        Self {
            verification_keys: vec![VerificationKey::hs256(kid.clone(), secret)],
            kid,
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
        }
    }

    /// RS256 key set from PEM-encoded key material
    pub fn rs256_from_pem(
        kid: impl Into<String>,
        private_key_pem: &[u8],
        public_key_pem: &[u8],
    ) -> Result<Self, TokenError> {
        let kid = kid.into();
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem).map_err(|e| TokenError::KeyLoad {
            message: format!("Invalid private key format: {}", e),
        })?;
        let verification = VerificationKey::rs256_from_pem(kid.clone(), public_key_pem)?;

        Ok(Self {
            kid,
            algorithm: Algorithm::RS256,
            encoding_key,
            verification_keys: vec![verification],
        })
    }

    /// RS256 key set from PEM files
    pub fn rs256_from_files<P: AsRef<Path>>(
        kid: impl Into<String>,
        private_key_path: P,
        public_key_path: P,
    ) -> Result<Self, TokenError> {
        let private_pem = read_pem(private_key_path.as_ref(), "private")?;
        let public_pem = read_pem(public_key_path.as_ref(), "public")?;
        Self::rs256_from_pem(kid, &private_pem, &public_pem)
    }

    /// Builds the key set described by the JWT configuration
    pub fn from_jwt_config(config: &JwtConfig) -> Result<Self, TokenError> {
        let mut keys = match config.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Self::hs256(config.key_id.clone(), config.secret.as_bytes()),
            "RS256" => {
                let (private_path, public_path) = config
                    .private_key_path
                    .as_deref()
                    .zip(config.public_key_path.as_deref())
                    .ok_or_else(|| TokenError::KeyLoad {
                        message: "RS256 algorithm requires private and public key paths".to_string(),
                    })?;
                Self::rs256_from_files(config.key_id.clone(), private_path, public_path)?
            }
            other => {
                return Err(TokenError::KeyLoad {
                    message: format!("Unsupported signing algorithm: {}", other),
                })
            }
        };

        for previous in &config.previous_keys {
            keys = keys.with_verification_key(verification_key_from_config(previous)?);
        }

        Ok(keys)
    }

    /// Adds a verification-only key. A key with an id already in the set
    /// replaces the existing one unless it is the active signing key.
    pub fn with_verification_key(mut self, key: VerificationKey) -> Self {
        if key.kid == self.kid {
            return self;
        }
        self.verification_keys.retain(|k| k.kid != key.kid);
        self.verification_keys.push(key);
        self
    }

    /// Key id written to the `kid` header of issued credentials
    pub fn active_kid(&self) -> &str {
        &self.kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Swaps the algorithm without touching the key material, leaving a key
    /// set that cannot sign
    #[cfg(test)]
    pub(crate) fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Verification key registered under `kid`
    pub fn find(&self, kid: &str) -> Option<&VerificationKey> {
        self.verification_keys.iter().find(|k| k.kid == kid)
    }

    pub fn verification_keys(&self) -> impl Iterator<Item = &VerificationKey> {
        self.verification_keys.iter()
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field(
                "verification_kids",
                &self.verification_keys.iter().map(|k| k.kid.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn verification_key_from_config(config: &VerificationKeyConfig) -> Result<VerificationKey, TokenError> {
    match (&config.secret, &config.public_key_path) {
        (Some(secret), None) => Ok(VerificationKey::hs256(config.key_id.clone(), secret.as_bytes())),
        (None, Some(path)) => VerificationKey::rs256_from_file(config.key_id.clone(), path),
        _ => Err(TokenError::KeyLoad {
            message: format!(
                "Verification key '{}' needs exactly one of secret or public_key_path",
                config.key_id
            ),
        }),
    }
}

fn read_pem(path: &Path, kind: &str) -> Result<Vec<u8>, TokenError> {
    fs::read(path).map_err(|e| TokenError::KeyLoad {
        message: format!("Failed to read {} key {}: {}", kind, path.display(), e),
    })
}
