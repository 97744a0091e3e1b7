//! Value objects representing immutable domain concepts.

pub mod refresh_secret;
pub mod session_bundle;

// Re-export commonly used types
pub use refresh_secret::{hash_secret, RefreshSecret, REFRESH_SECRET_BYTES};
pub use session_bundle::SessionBundle;
