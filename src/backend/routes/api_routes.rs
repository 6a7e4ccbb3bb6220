/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Direct messages
 * - `GET /api/dm` - Visible threads of the caller
 * - `POST /api/dm/start` - Get or create a thread with another user
 * - `GET /api/dm/{thread_id}/messages` - Message history
 * - `POST /api/dm/{thread_id}/messages` - Send a message
 * - `PUT /api/dm/{thread_id}/read` - Move the read pointer
 * - `DELETE /api/dm/{thread_id}/messages/{message_id}` - Soft delete a message
 * - `DELETE /api/dm/{thread_id}` - Hide the thread for the caller
 *
 * ## Channels
 * - `GET /api/chat/channels` / `POST /api/chat/channels`
 * - `DELETE /api/chat/channels/{channel_id}`
 * - `GET /api/chat/channels/{channel_id}/messages` / `POST` same path
 * - `GET /api/chat/channels/{channel_id}/members`
 *
 * ## Presence
 * - `GET /api/users/online` - Presence snapshot
 *
 * Every route here requires `Authorization: Bearer <token>`.
 */

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::backend::chat::handlers as channels;
use crate::backend::messaging::handlers as dm;
use crate::backend::middleware::{auth_middleware, AuthUser};
use crate::backend::server::state::AppState;
use crate::shared::PresenceEntry;

/// Add the API routes to `router`
///
/// The bearer-token middleware is applied with `route_layer`, so it only
/// runs for requests that matched one of these routes.
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let api = Router::new()
        // Direct messages
        .route("/api/dm", get(dm::list_threads))
        .route("/api/dm/start", post(dm::start_thread))
        .route("/api/dm/{thread_id}", delete(dm::delete_thread))
        .route(
            "/api/dm/{thread_id}/messages",
            get(dm::list_messages).post(dm::send_message),
        )
        .route("/api/dm/{thread_id}/read", put(dm::mark_read))
        .route(
            "/api/dm/{thread_id}/messages/{message_id}",
            delete(dm::delete_message),
        )
        // Channels
        .route(
            "/api/chat/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route(
            "/api/chat/channels/{channel_id}",
            delete(channels::delete_channel),
        )
        .route(
            "/api/chat/channels/{channel_id}/messages",
            get(channels::list_messages).post(channels::send_message),
        )
        .route(
            "/api/chat/channels/{channel_id}/members",
            get(channels::list_members),
        )
        // Presence
        .route("/api/users/online", get(online_users))
        .route_layer(from_fn_with_state(app_state, auth_middleware));

    router.merge(api)
}

/// `GET /api/users/online`
async fn online_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Json<Vec<PresenceEntry>> {
    Json(state.hub.online_users())
}
