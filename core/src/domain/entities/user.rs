//! User identity snapshot owned by the user directory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile-facing view of a user, referenced read-only by the session core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Unique identifier for the user
    pub id: Uuid,

    /// Name shown on the profile
    pub display_name: String,

    /// Profile picture location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Short profile description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserIdentity {
    /// Creates an identity with only a display name
    pub fn new(id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            bio: None,
        }
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }
}
