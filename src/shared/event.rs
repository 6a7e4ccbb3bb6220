/**
 * Real-time Event Protocol
 *
 * Closed set of events exchanged over the persistent connection. Every frame
 * is a JSON object of the form `{"event": "<name>", "data": {...}}`; events
 * without a payload may omit `data`.
 *
 * - `ClientEvent` - what a connected client may send
 * - `ServerEvent` - what the server pushes to connections
 *
 * Payloads have fixed field sets, so anything malformed is rejected at the
 * boundary with a `SharedError` before it reaches the engine.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::shared::error::SharedError;
use crate::shared::messaging::{ChannelMessage, DmMessage};
use crate::shared::presence::{PresenceEntry, PresenceStatus, RequestedStatus};

/// Event sent by a client over the socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    #[serde(rename = "join_channel")]
    JoinChannel { channel_id: Uuid },
    #[serde(rename = "leave_channel")]
    LeaveChannel { channel_id: Uuid },
    #[serde(rename = "send_message")]
    SendChannelMessage { channel_id: Uuid, content: String },
    #[serde(rename = "status_set")]
    SetStatus { status: RequestedStatus },
    /// Client inactivity timer elapsed
    #[serde(rename = "idle")]
    Idle,
    /// Client saw user activity again
    #[serde(rename = "activity")]
    Activity,
    #[serde(rename = "presence:list")]
    PresenceList,
    #[serde(rename = "dm:join_thread")]
    JoinThread { thread_id: Uuid },
    #[serde(rename = "dm:leave_thread")]
    LeaveThread { thread_id: Uuid },
    #[serde(rename = "dm:typing")]
    Typing { thread_id: Uuid },
    #[serde(rename = "dm:stop_typing")]
    StopTyping { thread_id: Uuid },
    #[serde(rename = "dm:send_message")]
    SendDirectMessage { thread_id: Uuid, content: String },
    #[serde(rename = "dm:mark_read")]
    MarkRead { thread_id: Uuid, last_read_message_id: Uuid },
    #[serde(rename = "dm:delete_message")]
    DeleteMessage { thread_id: Uuid, message_id: Uuid },
    #[serde(rename = "dm:delete_thread")]
    DeleteThread { thread_id: Uuid },
}

impl ClientEvent {
    /// Parse a text frame into an event
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        serde_json::from_str(text).map_err(SharedError::from)
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinChannel { .. } => "join_channel",
            Self::LeaveChannel { .. } => "leave_channel",
            Self::SendChannelMessage { .. } => "send_message",
            Self::SetStatus { .. } => "status_set",
            Self::Idle => "idle",
            Self::Activity => "activity",
            Self::PresenceList => "presence:list",
            Self::JoinThread { .. } => "dm:join_thread",
            Self::LeaveThread { .. } => "dm:leave_thread",
            Self::Typing { .. } => "dm:typing",
            Self::StopTyping { .. } => "dm:stop_typing",
            Self::SendDirectMessage { .. } => "dm:send_message",
            Self::MarkRead { .. } => "dm:mark_read",
            Self::DeleteMessage { .. } => "dm:delete_message",
            Self::DeleteThread { .. } => "dm:delete_thread",
        }
    }
}

/// Event pushed by the server to one or more connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Every non-offline user, sent on connect and on `presence:list`
    #[serde(rename = "initial_status_list")]
    PresenceSnapshot { users: Vec<PresenceEntry> },
    #[serde(rename = "status_change")]
    StatusChange { user_id: Uuid, status: PresenceStatus },
    #[serde(rename = "receive_message")]
    ChannelMessage { channel_id: Uuid, message: ChannelMessage },
    #[serde(rename = "channel_deleted")]
    ChannelDeleted { channel_id: Uuid },
    #[serde(rename = "dm:new_message")]
    DirectMessage { thread_id: Uuid, message: DmMessage },
    #[serde(rename = "dm:typing")]
    Typing { thread_id: Uuid, user_id: Uuid },
    #[serde(rename = "dm:stop_typing")]
    StopTyping { thread_id: Uuid, user_id: Uuid },
    #[serde(rename = "dm:read_receipt")]
    ReadReceipt {
        thread_id: Uuid,
        user_id: Uuid,
        last_read_message_id: Uuid,
        read_at: DateTime<Utc>,
    },
    #[serde(rename = "dm:message_deleted")]
    MessageDeleted { thread_id: Uuid, message_id: Uuid },
    /// Only ever delivered to the participant who hid the thread
    #[serde(rename = "dm:thread_deleted")]
    ThreadDeleted { thread_id: Uuid },
    /// Failure of a request, delivered to the requesting connection only
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Serialize to a text frame
    pub fn to_json(&self) -> Result<String, SharedError> {
        serde_json::to_string(self).map_err(SharedError::from)
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresenceSnapshot { .. } => "initial_status_list",
            Self::StatusChange { .. } => "status_change",
            Self::ChannelMessage { .. } => "receive_message",
            Self::ChannelDeleted { .. } => "channel_deleted",
            Self::DirectMessage { .. } => "dm:new_message",
            Self::Typing { .. } => "dm:typing",
            Self::StopTyping { .. } => "dm:stop_typing",
            Self::ReadReceipt { .. } => "dm:read_receipt",
            Self::MessageDeleted { .. } => "dm:message_deleted",
            Self::ThreadDeleted { .. } => "dm:thread_deleted",
            Self::Error { .. } => "error",
        }
    }
}
