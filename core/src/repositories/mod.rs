pub mod token;
pub mod user;

pub use token::{InMemoryRefreshStore, IssuedRefresh, RefreshStore};
pub use user::{InMemoryUserDirectory, UserDirectory};

#[cfg(test)]
pub use token::MockRefreshStore;
