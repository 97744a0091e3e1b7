//! MySQL implementation of the UserDirectory trait.
//!
//! Reads the `users` table owned by the profile service; nothing here writes
//! to it.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use wl_core::domain::entities::user::UserIdentity;
use wl_core::errors::DirectoryError;
use wl_core::repositories::UserDirectory;

/// MySQL implementation of UserDirectory
pub struct MySqlUserDirectory {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_identity(row: &sqlx::mysql::MySqlRow) -> Result<UserIdentity, DirectoryError> {
        let id: String = row.try_get("id").map_err(unavailable)?;

        Ok(UserIdentity {
            id: Uuid::parse_str(&id).map_err(|e| DirectoryError::Unavailable {
                message: format!("Invalid user UUID: {}", e),
            })?,
            display_name: row.try_get("display_name").map_err(unavailable)?,
            avatar_url: row.try_get("avatar_url").map_err(unavailable)?,
            bio: row.try_get("bio").map_err(unavailable)?,
        })
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn lookup_user(&self, user_id: Uuid) -> Result<UserIdentity, DirectoryError> {
        let query = r#"
            SELECT id, display_name, avatar_url, bio
            FROM users
            WHERE id = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "User lookup failed");
                unavailable(e)
            })?
            .ok_or(DirectoryError::NotFound)?;

        Self::row_to_identity(&row)
    }
}

fn unavailable(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Unavailable {
        message: err.to_string(),
    }
}
