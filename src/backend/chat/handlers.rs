//! Channel HTTP Handlers
//!
//! Channel operations that take part in live fan-out: creating and listing
//! channels, posting (published to the channel room just like the socket
//! `send_message` event) and deleting (broadcast to everyone).

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
    Channel, ChannelMessage, CreateChannelRequest, ListChannelMessagesResponse,
    ListChannelsResponse, ListMessagesParams, SendMessageRequest, SuccessResponse,
    UserWithStatus,
};

/// `GET /api/chat/channels`
pub async fn list_channels(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> BackendResult<Json<ListChannelsResponse>> {
    let channels = state.hub.list_channels().await?;
    Ok(Json(ListChannelsResponse { channels }))
}

/// `POST /api/chat/channels`
pub async fn create_channel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateChannelRequest>,
) -> BackendResult<(StatusCode, Json<Channel>)> {
    let channel = state
        .hub
        .create_channel(user.user_id, &request.name, request.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

/// `DELETE /api/chat/channels/{channel_id}`
pub async fn delete_channel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(channel_id): Path<Uuid>,
) -> BackendResult<Json<SuccessResponse>> {
    state.hub.delete_channel(user.user_id, channel_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /api/chat/channels/{channel_id}/messages?limit&offset`
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(channel_id): Path<Uuid>,
    Query(params): Query<ListMessagesParams>,
) -> BackendResult<Json<ListChannelMessagesResponse>> {
    let messages = state.hub.list_channel_messages(channel_id, &params).await?;
    Ok(Json(ListChannelMessagesResponse { messages }))
}

/// `POST /api/chat/channels/{channel_id}/messages`
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(channel_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<ChannelMessage>)> {
    let message = state
        .hub
        .send_channel_message(user.user_id, channel_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /api/chat/channels/{channel_id}/members`
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(channel_id): Path<Uuid>,
) -> BackendResult<Json<Vec<UserWithStatus>>> {
    Ok(Json(state.hub.channel_members(channel_id).await?))
}
