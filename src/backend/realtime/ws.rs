/**
 * WebSocket Transport
 *
 * Binds the hub to axum WebSockets. The credential is checked once, before
 * the upgrade; a missing or invalid token is answered with 401 and no socket
 * is opened.
 *
 * # Connection Task Layout
 *
 * - a writer task drains the connection's outbound queue into the socket sink
 * - the upgrade task reads frames and dispatches them one at a time, so the
 *   events of one connection are applied in the order they were received
 *
 * When the client goes away (or the server shuts down) the connection is
 * removed from the registry and from all rooms before the task ends.
 */

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::connections::ConnectionHandle;
use super::hub::RealtimeHub;
use crate::backend::error::BackendError;
use crate::backend::middleware::bearer_token;
use crate::backend::server::state::AppState;
use crate::shared::{ClientEvent, SharedError};

/// Query parameters of the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// `GET /ws` - authenticate, then upgrade to a WebSocket
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, BackendError> {
    let token = params
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| BackendError::authentication("Missing token"))?;

    let identity = state.auth.verify(token).map_err(|e| {
        warn!("[Realtime] Refused socket: {}", e);
        e
    })?;

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| run_connection(hub, identity.user_id, socket)))
}

async fn run_connection(hub: Arc<RealtimeHub>, user_id: Uuid, socket: WebSocket) {
    let mut shutdown = hub.shutdown_signal();
    let (handle, mut outbound) = match hub.connect(user_id).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!("[Realtime] Could not open connection for {}: {}", user_id, e);
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("[Realtime] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_frame(&hub, &handle, text.as_str()).await,
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => handle_frame(&hub, &handle, text).await,
                    Err(_) => {
                        let error = BackendError::from(SharedError::serialization("binary frame is not UTF-8"));
                        handle.deliver(error.to_event());
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("[Realtime] {} read error: {}", handle.id(), e);
                    break;
                }
            },
            _ = shutdown.changed() => break,
            _ = &mut writer => break,
        }
    }

    hub.disconnect(handle.id()).await;
    writer.abort();
}

/// Parse and dispatch one frame, reporting failures to this connection only
pub async fn handle_frame(hub: &RealtimeHub, conn: &ConnectionHandle, text: &str) {
    let result = match ClientEvent::parse(text) {
        Ok(event) => hub.dispatch(conn, event).await,
        Err(e) => Err(BackendError::from(e)),
    };

    if let Err(e) = result {
        if e.is_internal() {
            error!("[Realtime] {} event failed: {}", conn.id(), e);
        } else {
            warn!("[Realtime] {} event rejected: {}", conn.id(), e);
        }
        conn.deliver(e.to_event());
    }
}
