//! Common test utilities and helpers
//!
//! - Database fixtures (in-memory SQLite with migrations)
//! - Test users with tokens
//! - Event draining for connection receivers
//! - Assertion macros

#![allow(dead_code)]

#[macro_use]
pub mod assertions;
#[cfg(feature = "ssr")]
pub mod auth_helpers;
#[cfg(feature = "ssr")]
pub mod database;

#[cfg(feature = "ssr")]
pub use auth_helpers::*;
#[cfg(feature = "ssr")]
pub use database::*;
#[cfg(feature = "ssr")]
pub use events::*;
