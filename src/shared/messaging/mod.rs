//! Messaging Module
//!
//! Data structures for direct messages and group channels:
//!
//! - `UserSummary` - public profile embedded in messages and listings
//! - `DmMessage` - a message in a direct-message thread
//! - `ThreadSummary` - a thread as listed for one participant
//! - `Channel` / `ChannelMessage` - group channels
//!
//! # Usage
//!
//! ```rust
//! use chatflow::shared::messaging::{DmMessage, ThreadSummary, Channel};
//! ```

pub mod user;
pub mod message;
pub mod conversation;
pub mod channel;

pub use user::{UserSummary, UserWithStatus};
pub use message::{
    DmMessage, SendMessageRequest, MarkReadRequest, ListMessagesParams,
    ListMessagesResponse, SuccessResponse,
};
pub use conversation::{
    ThreadSummary, StartThreadRequest, StartThreadResponse, ListThreadsResponse,
};
pub use channel::{
    Channel, ChannelMessage, CreateChannelRequest, ListChannelsResponse,
    ListChannelMessagesResponse,
};
