//! Database test fixtures
//!
//! Every fixture is a private in-memory SQLite database with the migrations
//! applied, so tests never share state.

use std::sync::Arc;

use chatflow::backend::realtime::RealtimeHub;
use chatflow::backend::server::config::{load_database, ServerConfig};
use sqlx::SqlitePool;

pub const TEST_SECRET: &str = "chatflow-test-secret";
pub const TEST_BUFFER: usize = 256;

/// Configuration pointing at an in-memory database
pub fn test_config() -> ServerConfig {
    ServerConfig::builder()
        .jwt_secret(TEST_SECRET)
        .database_url("sqlite::memory:")
        .outbound_buffer(TEST_BUFFER)
        .build()
        .expect("test configuration is valid")
}

/// Test database fixture
pub struct TestDatabase {
    pool: SqlitePool,
}

impl TestDatabase {
    /// Create a fresh, migrated database
    pub async fn new() -> Self {
        let pool = load_database(&test_config())
            .await
            .expect("Failed to open test database");
        Self { pool }
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Hub backed by this database
    pub fn hub(&self) -> Arc<RealtimeHub> {
        Arc::new(RealtimeHub::new(self.pool.clone(), TEST_BUFFER))
    }
}
