//! ChatFlow - Main Library
//!
//! ChatFlow is a group-channel and direct-message chat service that combines
//! persisted history with live delivery over a persistent socket.
//!
//! # Overview
//!
//! The interesting part is the real-time engine:
//! - Connection registry tracking every live connection of every user
//! - Room membership for channels, DM threads and per-user notification rooms
//! - Presence state machine (online / away / dnd / offline)
//! - DM thread lifecycle with per-participant visibility and resurrection
//! - Event fan-out that persists first and publishes second
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared between server and clients
//!   - Client/server socket events
//!   - Presence status, DM and channel payloads
//!   - Boundary validation errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP + WebSocket server
//!   - Real-time hub (registry, rooms, presence, dispatcher)
//!   - SQLite persistence through sqlx
//!   - JWT authentication
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enabled by default)
//!   - Includes Axum server, database, JWT verification
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatflow::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let (app, _hub) = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All engine state lives in one `RealtimeHub` owned by the application state.
//! Its components are guarded by their own locks and are only mutated through
//! their methods; per-thread and per-user async locks serialize operations that
//! must not interleave.
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for malformed or invalid client payloads
//! - `backend::error::BackendError` for everything the engine and server raise

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
