//! # Wearly Core
//!
//! Session core for the Wearly backend: signed access credentials, rotating
//! refresh secrets grouped into families with replay detection, and the
//! session service that orchestrates them. Storage and user lookup sit
//! behind repository traits implemented here in memory and in `wl_infra`
//! against MySQL.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AccessCredential, Claims, RefreshRecord, RefreshStatus, RevocationReason, TokenValidationMeta,
    UserIdentity,
};
pub use domain::value_objects::{RefreshSecret, SessionBundle};
pub use errors::{
    DirectoryError, DomainError, DomainResult, IssueError, RefreshError, SessionError, StoreError,
    TokenError,
};
pub use repositories::{
    InMemoryRefreshStore, InMemoryUserDirectory, IssuedRefresh, RefreshStore, UserDirectory,
};
pub use services::{
    CleanupResult, Clock, IssuedTokens, ManualClock, SessionService, Signer, SigningKeys,
    SystemClock, TokenCleanupService, TokenIssuer, TokenServiceConfig, VerificationKey,
};
