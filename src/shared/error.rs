//! Shared Error Types
//!
//! Errors raised while validating client payloads. They are produced at the
//! boundary (socket frames, REST bodies) before anything reaches the store,
//! and are shared by server and client code.
//!
//! # Error Categories
//!
//! - `SerializationError` - a frame that is not a well-formed event
//! - `ValidationError` - a well-formed event whose fields break a rule
//!   (empty content, self-DM, unknown target user, bad status)
//!
//! # Usage
//!
//! ```rust
//! use chatflow::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "message content cannot be empty");
//! ```
use thiserror::Error;

/// Boundary validation errors shared between server and clients
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The offending field, if this is a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::SerializationError { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Reject message content that is empty once surrounding whitespace is ignored.
///
/// The content itself is stored as sent.
pub fn require_content(content: &str) -> Result<(), SharedError> {
    if content.trim().is_empty() {
        return Err(SharedError::validation(
            "content",
            "message content cannot be empty",
        ));
    }
    Ok(())
}
