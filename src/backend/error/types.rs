/**
 * Backend Error Types
 *
 * This module defines the errors raised by the real-time engine and the
 * HTTP/WebSocket server around it. Each variant corresponds to one failure
 * class of the engine and carries enough context to be rendered either as an
 * HTTP response or as an `error` event on the requesting socket.
 *
 * # Error Categories
 *
 * ## Authentication Errors
 *
 * Missing or invalid credential. On the socket this refuses the upgrade;
 * the server never retries.
 *
 * ## Authorization Errors
 *
 * The actor is not a participant of the thread, or not the sender of the
 * message. Nothing is persisted and nothing is fanned out.
 *
 * ## Validation Errors
 *
 * Empty content, self-DM, unknown target user, malformed frames. Raised
 * through `SharedError` before any store access.
 *
 * ## Not Found / Conflict
 *
 * Referenced thread, message or channel is absent. Conflicts come from the
 * one-thread-per-pair constraint and are resolved inside the thread manager.
 *
 * ## Store Errors
 *
 * The database call failed. No in-memory state has been touched; the caller
 * may retry the whole operation.
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatflow::backend::error::BackendError;
///
/// let err = BackendError::authorization("Not a participant of this thread");
/// assert_eq!(err.code(), "authorization_error");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or invalid credential
    #[error("Authentication error: {message}")]
    AuthenticationError {
        /// Human-readable error message
        message: String,
    },

    /// Actor may not act on the target resource
    #[error("Authorization error: {message}")]
    AuthorizationError {
        /// Human-readable error message
        message: String,
    },

    /// Referenced resource does not exist
    #[error("{resource} not found")]
    NotFoundError {
        /// Kind of resource that was looked up ("Thread", "Message", ...)
        resource: &'static str,
    },

    /// Unique constraint lost to a concurrent writer
    #[error("Conflict: {message}")]
    ConflictError {
        /// Human-readable error message
        message: String,
    },

    /// Inconsistent in-memory state (e.g. a connection registered twice)
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Validation or serialization error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Database failure
    #[error("Store error: {0}")]
    StoreError(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationError {
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::AuthorizationError {
            message: message.into(),
        }
    }

    /// Create a new not-found error for `resource`
    ///
    /// ```rust
    /// use chatflow::backend::error::BackendError;
    ///
    /// let err = BackendError::not_found("Thread");
    /// assert_eq!(err.message(), "Thread not found");
    /// ```
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFoundError { resource }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Shorthand for a validation error on `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::validation(field, message))
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `AuthenticationError` - 401 Unauthorized
    /// - `AuthorizationError` - 403 Forbidden
    /// - `NotFoundError` - 404 Not Found
    /// - `ConflictError` - 409 Conflict
    /// - `SharedError` - 400 Bad Request
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationError { .. } => StatusCode::UNAUTHORIZED,
            Self::AuthorizationError { .. } => StatusCode::FORBIDDEN,
            Self::NotFoundError { .. } => StatusCode::NOT_FOUND,
            Self::ConflictError { .. } => StatusCode::CONFLICT,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, used in HTTP bodies and socket error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationError { .. } => "authentication_error",
            Self::AuthorizationError { .. } => "authorization_error",
            Self::NotFoundError { .. } => "not_found",
            Self::ConflictError { .. } => "conflict",
            Self::SharedError(SharedError::ValidationError { .. }) => "validation_error",
            Self::SharedError(SharedError::SerializationError { .. }) => "invalid_payload",
            Self::StateError { .. } => "state_error",
            Self::StoreError(_) => "store_error",
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// Get the error message shown to clients
    ///
    /// Store failures are reported generically; the details only go to the log.
    pub fn message(&self) -> String {
        match self {
            Self::AuthenticationError { message } => message.clone(),
            Self::AuthorizationError { message } => message.clone(),
            Self::NotFoundError { .. } => self.to_string(),
            Self::ConflictError { message } => message.clone(),
            Self::StateError { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::StoreError(_) => "Database error, please retry".to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// True when the failure is on the server side rather than the request
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}
