//! Access credential signing and verification

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::token::{AccessCredential, Claims, TokenValidationMeta};
use crate::errors::TokenError;

use super::config::TokenServiceConfig;
use super::key_manager::{SigningKeys, VerificationKey};

/// Tolerated clock skew for the `nbf` claim, in seconds
const NOT_BEFORE_LEEWAY_SECS: i64 = 60;

/// Issues and verifies signed access credentials
///
/// Verification is pure: it reads the immutable key set and the `now`
/// passed in, nothing else.
#[derive(Debug, Clone)]
pub struct Signer {
    keys: SigningKeys,
    access_ttl: Duration,
    issuer: String,
    audience: String,
}

impl Signer {
    pub fn new(keys: SigningKeys, config: &TokenServiceConfig) -> Self {
        Self {
            keys,
            access_ttl: config.access_ttl,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs a credential for `user_id` valid from `now` until `now + access_ttl`
    pub fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<AccessCredential, TokenError> {
        let claims =
            Claims::new_access_token(user_id, now, self.access_ttl, &self.issuer, &self.audience);

        let mut header = Header::new(self.keys.algorithm());
        header.kid = Some(self.keys.active_kid().to_string());

        let token = encode(&header, &claims, self.keys.encoding_key()).map_err(|e| {
            tracing::error!(error = %e, kid = self.keys.active_kid(), "Failed to sign access credential");
            TokenError::SigningFailed
        })?;

        Ok(AccessCredential {
            token,
            user_id,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        })
    }

    /// Verifies a credential at instant `now`
    ///
    /// * `Malformed` - the token cannot be parsed or its claims are wrong
    /// * `SignatureInvalid` - no accepted key produces a matching signature
    /// * `Expired` - `now >= exp`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenValidationMeta, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;

        let candidates: Vec<&VerificationKey> = match header.kid.as_deref() {
            Some(kid) => self.keys.find(kid).into_iter().collect(),
            None => self.keys.verification_keys().collect(),
        };

        let mut last_error = TokenError::SignatureInvalid;
        for key in candidates {
            if key.algorithm() != header.alg {
                continue;
            }
            match decode::<Claims>(token, key.decoding_key(), &self.validation(key.algorithm())) {
                Ok(data) => return self.check_claims(data.claims, now),
                Err(e) => match map_jwt_error(e.kind()) {
                    TokenError::Malformed => return Err(TokenError::Malformed),
                    other => last_error = other,
                },
            }
        }

        Err(last_error)
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked against the injected clock in `check_claims`
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation
    }

    fn check_claims(&self, claims: Claims, now: DateTime<Utc>) -> Result<TokenValidationMeta, TokenError> {
        let user_id = claims.user_id().map_err(|_| TokenError::Malformed)?;

        if claims.nbf > now.timestamp() + NOT_BEFORE_LEEWAY_SECS {
            return Err(TokenError::Malformed);
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(TokenValidationMeta {
            user_id,
            expires_at: claims.expires_at(),
            token_id: claims.jti,
        })
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidEcdsaKey => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
