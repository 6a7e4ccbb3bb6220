//! Backend Module
//!
//! All server-side code: the Axum HTTP server, the real-time engine and
//! SQLite persistence. Only compiled with the `ssr` feature.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, app creation
//! - **`routes`** - Router assembly
//! - **`realtime`** - Connections, rooms, presence and event dispatch
//! - **`messaging`** - Direct-message threads
//! - **`chat`** - Group channels
//! - **`auth`** - JWT verification and the user directory
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend error type
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Configuration, state, init
//! ├── routes/         - Route configuration
//! ├── realtime/       - Real-time engine and /ws
//! ├── messaging/      - DM threads
//! ├── chat/           - Channels
//! ├── auth/           - Tokens and users
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Concurrency
//!
//! Mutating DM operations on the same thread are serialized by a per-thread
//! lock; connect and disconnect of the same user by a per-user lock. Thread
//! creation for a pair of users is serialized by a per-pair lock and backed
//! by a unique index. Fan-out never blocks on a slow client: each connection
//! has a bounded outbound queue, and events that do not fit are dropped.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Group channels
pub mod chat;

/// Real-time engine
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and user directory
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Direct messaging
pub mod messaging;

pub use error::{BackendError, BackendResult};
pub use realtime::RealtimeHub;
pub use server::{create_app, AppState, ServerConfig};
