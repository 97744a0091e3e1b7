//! Token services for access credentials and refresh secrets
//!
//! This module handles:
//! - JWT access credential signing and verification (HS256 or RS256)
//! - Signing key sets with `kid`-based rotation
//! - Issuance of credential/refresh pairs at login and rotation
//! - Background purge of expired refresh records

mod cleanup;
mod config;
mod issuer;
mod key_manager;
mod signer;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use issuer::{IssuedTokens, TokenIssuer};
pub use key_manager::{SigningKeys, VerificationKey};
pub use signer::Signer;
