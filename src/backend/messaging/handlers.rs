//! Direct Message HTTP Handlers
//!
//! REST counterparts of the DM socket events, for clients that do not keep a
//! socket open. Every mutating handler goes through the hub, so a message
//! sent here reaches live connections exactly like one sent over `/ws`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{
    DmMessage, ListMessagesParams, ListMessagesResponse, ListThreadsResponse, MarkReadRequest,
    SendMessageRequest, StartThreadRequest, StartThreadResponse, SuccessResponse,
};

/// `GET /api/dm` - threads visible to the caller
pub async fn list_threads(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<ListThreadsResponse>> {
    let threads = state.hub.list_threads(user.user_id).await?;
    Ok(Json(ListThreadsResponse { threads }))
}

/// `POST /api/dm/start` - get or create the thread with another user
pub async fn start_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<StartThreadRequest>,
) -> BackendResult<Json<StartThreadResponse>> {
    let thread_id = state
        .hub
        .start_thread(user.user_id, request.target_user_id)
        .await?;
    Ok(Json(StartThreadResponse { thread_id }))
}

/// `GET /api/dm/{thread_id}/messages?limit&offset`
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(thread_id): Path<Uuid>,
    Query(params): Query<ListMessagesParams>,
) -> BackendResult<Json<ListMessagesResponse>> {
    let page = state
        .hub
        .list_direct_messages(user.user_id, thread_id, &params)
        .await?;
    Ok(Json(page))
}

/// `POST /api/dm/{thread_id}/messages`
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<DmMessage>)> {
    let message = state
        .hub
        .send_direct_message(user.user_id, thread_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `PUT /api/dm/{thread_id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<MarkReadRequest>,
) -> BackendResult<Json<SuccessResponse>> {
    state
        .hub
        .mark_read(user.user_id, thread_id, request.last_read_message_id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `DELETE /api/dm/{thread_id}/messages/{message_id}`
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((thread_id, message_id)): Path<(Uuid, Uuid)>,
) -> BackendResult<Json<SuccessResponse>> {
    state
        .hub
        .delete_direct_message(user.user_id, thread_id, message_id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `DELETE /api/dm/{thread_id}` - hide the thread for the caller
pub async fn delete_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(thread_id): Path<Uuid>,
) -> BackendResult<Json<SuccessResponse>> {
    state.hub.delete_thread(user.user_id, thread_id).await?;
    Ok(Json(SuccessResponse::ok()))
}
