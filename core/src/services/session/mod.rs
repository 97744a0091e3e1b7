//! Session service module
//!
//! The caller-facing surface of the session core: login, refresh, logout,
//! sign-out-everywhere and access credential authorization.

mod service;


pub use service::SessionService;
