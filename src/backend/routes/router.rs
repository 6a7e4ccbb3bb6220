/**
 * Router Configuration
 *
 * Combines all route groups into a single Axum router.
 *
 * # Route Order
 *
 * 1. Public routes (`/health`, `/ws`)
 * 2. API routes (bearer-token protected)
 * 3. Fallback handler (404)
 *
 * `/ws` authenticates on its own before upgrading, so it is not behind the
 * bearer middleware.
 */

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::realtime::ws_handler;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// - `GET /health` - Liveness probe
/// - `GET /ws` - WebSocket upgrade (`?token=` or `Authorization: Bearer`)
/// - `/api/...` - See [`configure_api_routes`]
pub fn create_router(app_state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler));

    configure_api_routes(router, app_state.clone())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found", "code": "not_found", "status": 404 })),
    )
}
