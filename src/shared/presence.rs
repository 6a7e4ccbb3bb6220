//! Presence Types
//!
//! Coarse availability of a user, independent of any conversation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's availability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    /// Do not disturb. Only an explicit status change leaves this state.
    Dnd,
    #[default]
    Offline,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Away => "away",
            PresenceStatus::Dnd => "dnd",
            PresenceStatus::Offline => "offline",
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, PresenceStatus::Offline)
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a client may request explicitly.
///
/// `offline` is not requestable: it is derived from the connection count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestedStatus {
    Online,
    Away,
    Dnd,
}

impl From<RequestedStatus> for PresenceStatus {
    fn from(status: RequestedStatus) -> Self {
        match status {
            RequestedStatus::Online => PresenceStatus::Online,
            RequestedStatus::Away => PresenceStatus::Away,
            RequestedStatus::Dnd => PresenceStatus::Dnd,
        }
    }
}

/// One entry of the online-users snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user_id: Uuid,
    pub status: PresenceStatus,
    pub since: DateTime<Utc>,
}
