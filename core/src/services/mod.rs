//! Business services containing the session use cases.

pub mod clock;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::SessionService;
pub use token::{
    CleanupResult, IssuedTokens, Signer, SigningKeys, TokenCleanupService, TokenIssuer,
    TokenServiceConfig, VerificationKey,
};
