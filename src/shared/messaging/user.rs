//! User Profile Data Structure
//!
//! The public part of a user record, as embedded in messages and thread
//! listings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::presence::PresenceStatus;

/// Public profile of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl UserSummary {
    /// Get display name or fallback to username
    pub fn display_name_or_username(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// A profile together with the user's live presence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserWithStatus {
    #[serde(flatten)]
    pub profile: UserSummary,
    pub status: PresenceStatus,
}
