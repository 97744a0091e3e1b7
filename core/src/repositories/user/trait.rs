//! User directory trait: the read-only view of users the session core needs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user::UserIdentity;
use crate::errors::DirectoryError;

/// Lookup of user identities owned by another component
///
/// The session core never writes through this trait.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a user by id
    ///
    /// # Returns
    /// * `Ok(UserIdentity)` - User found
    /// * `Err(DirectoryError::NotFound)` - No such user
    /// * `Err(DirectoryError::Unavailable)` - The directory could not be reached
    async fn lookup_user(&self, user_id: Uuid) -> Result<UserIdentity, DirectoryError>;
}
