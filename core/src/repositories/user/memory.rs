//! In-process user directory

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user::UserIdentity;
use crate::errors::DirectoryError;

use super::r#trait::UserDirectory;

/// User directory backed by a map, for tests and local tooling
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Directory pre-populated with `users`
    pub fn with_users(users: impl IntoIterator<Item = UserIdentity>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    /// Adds or replaces a user
    pub async fn insert(&self, user: UserIdentity) {
        self.users.write().await.insert(user.id, user);
    }

    /// Removes a user, returning it if present
    pub async fn remove(&self, user_id: Uuid) -> Option<UserIdentity> {
        self.users.write().await.remove(&user_id)
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup_user(&self, user_id: Uuid) -> Result<UserIdentity, DirectoryError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }
}
