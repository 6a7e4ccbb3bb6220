/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container, holding:
 * - the SQLite pool
 * - the real-time hub (connections, rooms, presence, DM threads)
 * - the token verifier
 * - the loaded configuration
 *
 * Everything is cheap to clone: the hub and the configuration sit behind
 * `Arc`, the pool and the verifier are handles.
 *
 * # Example
 *
 * ```rust,ignore
 * use axum::extract::State;
 * use chatflow::backend::server::state::AppState;
 *
 * async fn handler(State(state): State<AppState>) {
 *     let online = state.hub.online_users();
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use super::config::ServerConfig;
use crate::backend::auth::JwtAuth;
use crate::backend::realtime::RealtimeHub;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub pool: SqlitePool,
    /// Real-time engine
    pub hub: Arc<RealtimeHub>,
    /// Token verification
    pub auth: JwtAuth,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the state around an already migrated pool
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Self {
        let hub = Arc::new(RealtimeHub::new(pool.clone(), config.outbound_buffer));
        let auth = JwtAuth::new(&config.jwt_secret, config.token_ttl_hours);
        Self {
            pool,
            hub,
            auth,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<RealtimeHub> {
    fn from_ref(state: &AppState) -> Self {
        state.hub.clone()
    }
}

impl FromRef<AppState> for JwtAuth {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
