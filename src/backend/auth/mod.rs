//! Authentication Module
//!
//! Resolves bearer credentials to user identities and stores the minimal
//! user profile the chat service embeds in messages and thread listings.
//!
//! # Architecture
//!
//! - **`sessions`** - JWT token generation and validation (`JwtAuth`)
//! - **`users`** - User record and database operations
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! └── sessions.rs     - JWT token management
//! ```
//!
//! # Authentication Flow
//!
//! 1. **REST**: `Authorization: Bearer <token>` → `auth_middleware` verifies →
//!    `AuthUser` extractor hands the identity to the handler
//! 2. **Socket**: token in `?token=` or the `Authorization` header → verified
//!    once at upgrade time → refused with 401 on failure
//!
//! Login and registration are handled by another service; `JwtAuth` only
//! issues tokens for tests and tooling.

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{Claims, JwtAuth, VerifiedIdentity};
pub use users::{User, create_user, get_user_by_id};
