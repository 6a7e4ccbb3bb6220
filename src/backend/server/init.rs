/**
 * Server Initialization
 *
 * Turns a `ServerConfig` into a ready router:
 *
 * 1. open the database and run migrations
 * 2. build `AppState` (hub, token verifier)
 * 3. assemble routes and middleware
 *
 * The hub is returned next to the router so that the caller can shut it
 * down when the server stops.
 */

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tracing::info;

use super::config::{load_database, ConfigError, ServerConfig};
use super::state::AppState;
use crate::backend::realtime::RealtimeHub;
use crate::backend::routes::create_router;

/// Create the application from configuration
///
/// # Errors
///
/// Fails if the configuration is invalid, the database cannot be opened,
/// or migrations fail.
pub async fn create_app(config: ServerConfig) -> Result<(Router, Arc<RealtimeHub>), ConfigError> {
    config.validate()?;
    let pool = load_database(&config).await?;
    info!("[Server] Database ready at {}", config.database_url);
    Ok(create_app_with_pool(pool, config))
}

/// Create the application around an existing, migrated pool
pub fn create_app_with_pool(pool: SqlitePool, config: ServerConfig) -> (Router, Arc<RealtimeHub>) {
    let state = AppState::new(pool, config);
    let hub = state.hub.clone();
    (create_router(state), hub)
}
