//! MySQL implementations of the session core repositories

pub mod refresh_store;
pub mod user_directory;

pub use refresh_store::MySqlRefreshStore;
pub use user_directory::MySqlUserDirectory;
