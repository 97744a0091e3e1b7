//! Tests for access credential signing and verification

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

use crate::domain::entities::token::Claims;
use crate::errors::TokenError;
use crate::services::token::{Signer, SigningKeys, TokenServiceConfig, VerificationKey};

const RS256_PRIVATE: &[u8] = include_bytes!("fixtures/rs256_private.pem");
const RS256_PUBLIC: &[u8] = include_bytes!("fixtures/rs256_public.pem");
const SECRET: &[u8] = b"test-signing-secret-with-enough-entropy";

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn config() -> TokenServiceConfig {
    TokenServiceConfig::default().with_access_ttl(Duration::seconds(300))
}

fn hs256_signer() -> Signer {
    Signer::new(SigningKeys::hs256("k1", SECRET), &config())
}

fn rs256_signer() -> Signer {
    let keys = SigningKeys::rs256_from_pem("rsa-1", RS256_PRIVATE, RS256_PUBLIC).unwrap();
    Signer::new(keys, &config())
}

#[test]
fn test_issue_and_verify_hs256() {
    let signer = hs256_signer();
    let user_id = Uuid::new_v4();

    let credential = signer.issue(user_id, t(0)).unwrap();
    assert_eq!(credential.user_id, user_id);
    assert_eq!(credential.issued_at, t(0));
    assert_eq!(credential.expires_at, t(300));

    let meta = signer.verify(&credential.token, t(0)).unwrap();
    assert_eq!(meta.user_id, user_id);
    assert_eq!(meta.expires_at, t(300));
    assert!(!meta.token_id.is_empty());
}

#[test]
fn test_issue_and_verify_rs256() {
    let signer = rs256_signer();
    let user_id = Uuid::new_v4();

    let credential = signer.issue(user_id, t(0)).unwrap();
    let header = jsonwebtoken::decode_header(&credential.token).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("rsa-1"));

    let meta = signer.verify(&credential.token, t(10)).unwrap();
    assert_eq!(meta.user_id, user_id);
}

#[test]
fn test_expiry_boundary() {
    let signer = hs256_signer();
    let credential = signer.issue(Uuid::new_v4(), t(0)).unwrap();

    assert!(signer.verify(&credential.token, t(299)).is_ok());
    assert_eq!(signer.verify(&credential.token, t(300)), Err(TokenError::Expired));
    assert_eq!(signer.verify(&credential.token, t(301)), Err(TokenError::Expired));
}

#[test]
fn test_each_credential_is_unique() {
    let signer = hs256_signer();
    let user_id = Uuid::new_v4();

    let a = signer.issue(user_id, t(0)).unwrap();
    let b = signer.issue(user_id, t(0)).unwrap();
    assert_ne!(a.token, b.token);
}

#[test]
fn test_garbage_is_malformed() {
    let signer = hs256_signer();
    assert_eq!(signer.verify("not-a-jwt", t(0)), Err(TokenError::Malformed));
    assert_eq!(signer.verify("", t(0)), Err(TokenError::Malformed));
    assert_eq!(signer.verify("a.b.c", t(0)), Err(TokenError::Malformed));
}

#[test]
fn test_foreign_key_is_signature_invalid() {
    let signer = hs256_signer();
    let impostor = Signer::new(SigningKeys::hs256("k1", b"some-other-secret"), &config());

    let forged = impostor.issue(Uuid::new_v4(), t(0)).unwrap();
    assert_eq!(signer.verify(&forged.token, t(0)), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_swapped_payload_is_signature_invalid() {
    let signer = hs256_signer();
    let victim = signer.issue(Uuid::new_v4(), t(0)).unwrap();
    let attacker = signer.issue(Uuid::new_v4(), t(0)).unwrap();

    let victim_parts: Vec<&str> = victim.token.split('.').collect();
    let attacker_parts: Vec<&str> = attacker.token.split('.').collect();
    let spliced = format!("{}.{}.{}", attacker_parts[0], victim_parts[1], attacker_parts[2]);

    assert_eq!(signer.verify(&spliced, t(0)), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_unknown_kid_is_signature_invalid() {
    let signer = hs256_signer();
    let other_kid = Signer::new(SigningKeys::hs256("unknown", SECRET), &config());

    let credential = other_kid.issue(Uuid::new_v4(), t(0)).unwrap();
    assert_eq!(signer.verify(&credential.token, t(0)), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_algorithm_mismatch_is_signature_invalid() {
    let rsa = rs256_signer();
    let hmac = Signer::new(SigningKeys::hs256("rsa-1", SECRET), &config());

    let credential = hmac.issue(Uuid::new_v4(), t(0)).unwrap();
    assert_eq!(rsa.verify(&credential.token, t(0)), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_wrong_issuer_is_malformed() {
    let signer = hs256_signer();
    let other_issuer = Signer::new(
        SigningKeys::hs256("k1", SECRET),
        &TokenServiceConfig {
            issuer: "someone-else".to_string(),
            ..config()
        },
    );

    let credential = other_issuer.issue(Uuid::new_v4(), t(0)).unwrap();
    assert_eq!(signer.verify(&credential.token, t(0)), Err(TokenError::Malformed));
}

#[test]
fn test_non_uuid_subject_is_malformed() {
    let signer = hs256_signer();
    let mut claims = Claims::new_access_token(
        Uuid::new_v4(),
        t(0),
        Duration::seconds(300),
        &config().issuer,
        &config().audience,
    );
    claims.sub = "not-a-uuid".to_string();

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("k1".to_string());
    let token = encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap();

    assert_eq!(signer.verify(&token, t(0)), Err(TokenError::Malformed));
}

#[test]
fn test_future_not_before_is_malformed() {
    let signer = hs256_signer();
    let mut claims = Claims::new_access_token(
        Uuid::new_v4(),
        t(0),
        Duration::seconds(3_600),
        &config().issuer,
        &config().audience,
    );
    claims.nbf = t(600).timestamp();

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("k1".to_string());
    let token = encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap();

    assert_eq!(signer.verify(&token, t(0)), Err(TokenError::Malformed));
    // Within the skew allowance
    assert!(signer.verify(&token, t(545)).is_ok());
}

#[test]
fn test_token_without_kid_tries_every_key() {
    let signer = hs256_signer();
    let user_id = Uuid::new_v4();
    let claims = Claims::new_access_token(
        user_id,
        t(0),
        Duration::seconds(300),
        &config().issuer,
        &config().audience,
    );
    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap();

    assert_eq!(signer.verify(&token, t(1)).unwrap().user_id, user_id);
}

#[test]
fn test_rotated_key_still_verifies_old_credentials() {
    let old_secret = b"previous-secret-value";
    let old_signer = Signer::new(SigningKeys::hs256("2025-01", old_secret), &config());
    let new_keys = SigningKeys::hs256("2025-06", SECRET)
        .with_verification_key(VerificationKey::hs256("2025-01", old_secret));
    let new_signer = Signer::new(new_keys, &config());

    let old_credential = old_signer.issue(Uuid::new_v4(), t(0)).unwrap();
    assert!(new_signer.verify(&old_credential.token, t(1)).is_ok());

    let new_credential = new_signer.issue(Uuid::new_v4(), t(0)).unwrap();
    assert_eq!(
        jsonwebtoken::decode_header(&new_credential.token).unwrap().kid.as_deref(),
        Some("2025-06")
    );
    assert_eq!(
        old_signer.verify(&new_credential.token, t(1)),
        Err(TokenError::SignatureInvalid)
    );
}

#[test]
fn test_verification_key_cannot_replace_active_key() {
    let keys = SigningKeys::hs256("k1", SECRET)
        .with_verification_key(VerificationKey::hs256("k1", b"shadow"))
        .with_verification_key(VerificationKey::hs256("k0", b"a"))
        .with_verification_key(VerificationKey::hs256("k0", b"b"));

    assert_eq!(keys.verification_keys().count(), 2);
    let signer = Signer::new(keys, &config());
    let credential = signer.issue(Uuid::new_v4(), t(0)).unwrap();
    assert!(signer.verify(&credential.token, t(0)).is_ok());
}

#[test]
fn test_signing_failure_is_reported() {
    let keys = SigningKeys::rs256_from_pem("rsa-1", RS256_PRIVATE, RS256_PUBLIC)
        .unwrap()
        .with_algorithm(Algorithm::HS256);
    let signer = Signer::new(keys, &config());

    assert_eq!(signer.issue(Uuid::new_v4(), t(0)), Err(TokenError::SigningFailed));
}

#[test]
fn test_invalid_pem_fails_to_load() {
    let result = SigningKeys::rs256_from_pem("rsa-1", b"not a key", RS256_PUBLIC);
    assert!(matches!(result, Err(TokenError::KeyLoad { .. })));

    let result = SigningKeys::rs256_from_files("rsa-1", "/nonexistent/private.pem", "/nonexistent/public.pem");
    assert!(matches!(result, Err(TokenError::KeyLoad { .. })));
}

#[test]
fn test_keys_from_jwt_config() {
    use wl_shared::config::{JwtConfig, VerificationKeyConfig};

    let mut jwt = JwtConfig::new("configured-secret".to_string());
    jwt.key_id = "primary".to_string();
    jwt.previous_keys = vec![VerificationKeyConfig {
        key_id: "retired".to_string(),
        secret: Some("retired-secret".to_string()),
        public_key_path: None,
    }];

    let keys = SigningKeys::from_jwt_config(&jwt).unwrap();
    assert_eq!(keys.active_kid(), "primary");
    assert_eq!(keys.algorithm(), Algorithm::HS256);
    assert!(keys.find("retired").is_some());

    jwt.algorithm = "RS256".to_string();
    assert!(matches!(
        SigningKeys::from_jwt_config(&jwt),
        Err(TokenError::KeyLoad { .. })
    ));

    jwt.algorithm = "ES512".to_string();
    assert!(matches!(
        SigningKeys::from_jwt_config(&jwt),
        Err(TokenError::KeyLoad { .. })
    ));
}
