//! Shared Module
//!
//! Types shared between the server and any client of the chat service.
//! These are the wire contract: socket events, presence values, DM and
//! channel payloads, and boundary validation errors.
//!
//! # Overview
//!
//! Nothing in here depends on the server stack, so a client can depend on
//! the crate with default features disabled and still speak the protocol.

/// Socket event protocol
pub mod event;

/// Shared error types
pub mod error;

/// Presence status values
pub mod presence;

/// Direct-message and channel payloads
pub mod messaging;

/// Re-export commonly used types for convenience
pub use event::{ClientEvent, ServerEvent};
pub use error::SharedError;
pub use presence::{PresenceEntry, PresenceStatus, RequestedStatus};
