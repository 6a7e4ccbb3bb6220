//! Direct-Message Thread Data Structure
//!
//! A thread between exactly two users, as listed for one of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserWithStatus;

/// A visible thread from the point of view of one participant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_id: Uuid,
    /// The other participant, with live presence
    pub other_user: UserWithStatus,
    /// Preview of the last message; `None` when there is none or it was deleted
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Messages from the other participant after the caller's read pointer
    pub unread_count: u32,
}

/// Request to open (or reopen) a thread with another user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartThreadRequest {
    pub target_user_id: Uuid,
}

/// Response carrying the thread id, whether it was just created or not
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartThreadResponse {
    pub thread_id: Uuid,
}

/// Response for listing threads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadSummary>,
}
