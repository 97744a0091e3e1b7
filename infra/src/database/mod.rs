//! Database module - MySQL implementations using SQLx
//!
//! This module provides:
//! - Connection pool management and migrations
//! - The transactional refresh store
//! - The read-only user directory

pub mod connection;
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlRefreshStore, MySqlUserDirectory};
