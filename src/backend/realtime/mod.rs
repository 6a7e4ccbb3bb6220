//! Real-time Engine Module
//!
//! Presence and direct-message fan-out over persistent WebSocket
//! connections.
//!
//! # Architecture
//!
//! - **`connections`** - Connection registry (user → live connections)
//! - **`rooms`** - Room membership (channels, `thread:<id>`, `user:<id>`)
//! - **`presence`** - Presence state machine
//! - **`lock`** - Per-key async locks (per thread, per user, per pair)
//! - **`broadcast`** - Global and per-user fan-out helpers
//! - **`hub`** - `RealtimeHub`, the owned engine instance
//! - **`session`** - Connect / disconnect bootstrap
//! - **`dispatcher`** - Inbound event handling, shared with REST
//! - **`ws`** - axum WebSocket transport
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connections.rs  - ConnectionRegistry, ConnectionHandle
//! ├── rooms.rs        - RoomManager, RoomId
//! ├── presence.rs     - PresenceTracker
//! ├── lock.rs         - KeyedLocks
//! ├── broadcast.rs    - broadcast_all, notify_users
//! ├── hub.rs          - RealtimeHub
//! ├── session.rs      - connect / disconnect
//! ├── dispatcher.rs   - dispatch and DM / channel operations
//! └── ws.rs           - GET /ws
//! ```
//!
//! Everything except `ws` is transport independent: tests drive the hub
//! through `connect` and `dispatch` and read events from the outbound
//! receivers, without a network stack.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatflow::backend::realtime::RealtimeHub;
//! use chatflow::shared::ClientEvent;
//!
//! # async fn example(pool: sqlx::SqlitePool, user_id: uuid::Uuid) -> Result<(), chatflow::backend::BackendError> {
//! let hub = RealtimeHub::new(pool, 256);
//! let (conn, mut events) = hub.connect(user_id).await?;
//! hub.dispatch(&conn, ClientEvent::Idle).await?;
//! let snapshot = events.recv().await;
//! # Ok(())
//! # }
//! ```

/// Connection registry
pub mod connections;

/// Room membership manager
pub mod rooms;

/// Presence state machine
pub mod presence;

/// Per-key async locks
pub mod lock;

/// Fan-out helpers
pub mod broadcast;

/// The engine instance
pub mod hub;

/// Session bootstrap and teardown
pub mod session;

/// Inbound event dispatch
pub mod dispatcher;

/// WebSocket transport
pub mod ws;

// Re-export commonly used types and functions
pub use connections::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use hub::RealtimeHub;
pub use presence::{PresenceChange, PresenceTracker};
pub use rooms::{RoomId, RoomManager};
pub use ws::ws_handler;
