//! Route Configuration Module
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, public routes, layers
//! - **`api_routes`** - Authenticated REST endpoints
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - create_router, /health, /ws, fallback
//! └── api_routes.rs   - /api/dm, /api/chat, /api/users
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use chatflow::backend::routes::create_router;
//! use chatflow::backend::server::state::AppState;
//!
//! let router = create_router(AppState::new(pool, config));
//! ```

/// Main router creation
pub mod router;

/// API endpoint configuration
pub mod api_routes;

pub use router::create_router;
