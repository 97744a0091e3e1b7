//! Domain entities representing core business objects.

pub mod token;
pub mod user;

// Re-export commonly used types
pub use token::{
    AccessCredential, Claims, RefreshRecord, RefreshStatus, RevocationReason,
    TokenValidationMeta, ACCESS_TOKEN_EXPIRY_SECS, JWT_AUDIENCE, JWT_ISSUER,
    REFRESH_TOKEN_EXPIRY_SECS,
};
pub use user::UserIdentity;
