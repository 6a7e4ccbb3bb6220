/**
 * Session Bootstrap and Teardown
 *
 * Connect:
 * 1. register the connection
 * 2. join the user's personal room `user:<id>`
 * 3. on the user's first connection, move presence out of offline and
 *    broadcast the change to everyone
 * 4. send the new connection a snapshot of all non-offline users
 *
 * Disconnect removes the connection from the registry and from every room
 * before anything else happens; when it was the user's last connection the
 * user goes offline and everyone is told.
 *
 * Both run under the user's lock so that a connect racing a disconnect of
 * the same user cannot leave presence out of step with the connection count.
 */

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::broadcast::broadcast_all;
use super::connections::{ConnectionHandle, ConnectionId};
use super::hub::RealtimeHub;
use super::rooms::RoomId;
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::ServerEvent;

impl RealtimeHub {
    /// Open a new connection for `user_id`
    ///
    /// Returns the handle and the receiving end of its outbound queue.
    pub async fn connect(
        &self,
        user_id: Uuid,
    ) -> BackendResult<(ConnectionHandle, mpsc::Receiver<ServerEvent>)> {
        if self.is_shutting_down() {
            return Err(BackendError::state("Server is shutting down"));
        }
        let (handle, outbound) = ConnectionHandle::channel(user_id, self.outbound_buffer);
        self.attach(handle.clone()).await?;
        Ok((handle, outbound))
    }

    /// Register an existing handle and bootstrap its session
    pub async fn attach(&self, handle: ConnectionHandle) -> BackendResult<()> {
        let user_id = handle.user_id();
        let _guard = self.user_locks.lock(user_id).await;

        let count = self.registry.register(handle.clone())?;
        self.rooms.join(RoomId::User(user_id), &handle);
        info!(
            "[Realtime] {} opened for user {} ({} live)",
            handle.id(),
            user_id,
            count
        );

        if count == 1 {
            if let Some(change) = self.presence.connected(user_id) {
                info!("[Presence] {} is now {}", user_id, change.to);
                broadcast_all(&self.registry, &change.to_event());
            }
        }

        handle.deliver(ServerEvent::PresenceSnapshot {
            users: self.presence.snapshot(),
        });
        Ok(())
    }

    /// Close a connection; unknown or already closed connections are ignored
    pub async fn disconnect(&self, id: ConnectionId) {
        let Some(handle) = self.registry.get(id) else {
            debug!("[Realtime] {} already gone", id);
            return;
        };
        let user_id = handle.user_id();
        let _guard = self.user_locks.lock(user_id).await;

        let left = self.rooms.leave_all(id);
        let Some(removed) = self.registry.deregister(id) else {
            return;
        };
        let lifetime = Utc::now() - handle.opened_at();
        info!(
            "[Realtime] {} closed for user {} after {}s (left {} rooms, {} live)",
            id,
            user_id,
            lifetime.num_seconds(),
            left,
            removed.remaining
        );

        if removed.remaining == 0 {
            if let Some(change) = self.presence.disconnected(user_id) {
                info!("[Presence] {} is now {}", user_id, change.to);
                broadcast_all(&self.registry, &change.to_event());
            }
        }
    }
}
