/**
 * Realtime Hub
 *
 * The single, explicitly owned instance of the real-time engine. It is
 * created once at startup, shared through `AppState`, and torn down at
 * shutdown. It bundles:
 *
 * - `ConnectionRegistry` - live connections per user
 * - `RoomManager` - channel, thread and personal rooms
 * - `PresenceTracker` - per-user status
 * - `DmThreads` - DM thread lifecycle over the database
 * - per-user and per-thread async locks
 *
 * Session bootstrap lives in `session.rs` and event handling in
 * `dispatcher.rs`; both are `impl RealtimeHub` blocks.
 *
 * # Locking
 *
 * - per-user lock: connect, disconnect and status changes of one user
 * - per-thread lock: persistence and fan-out of one DM thread, so that
 *   events of a thread are published in the order they were applied
 *
 * Locks are never held across unrelated keys, so a slow thread does not
 * delay any other thread or user.
 */

use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::connections::ConnectionRegistry;
use super::lock::KeyedLocks;
use super::presence::PresenceTracker;
use super::rooms::RoomManager;
use crate::backend::messaging::threads::DmThreads;
use crate::shared::PresenceEntry;

pub struct RealtimeHub {
    pub(super) registry: ConnectionRegistry,
    pub(super) rooms: RoomManager,
    pub(super) presence: PresenceTracker,
    pub(super) threads: DmThreads,
    pub(super) user_locks: KeyedLocks<Uuid>,
    pub(super) thread_locks: KeyedLocks<Uuid>,
    pub(super) outbound_buffer: usize,
    shutdown: watch::Sender<bool>,
}

impl RealtimeHub {
    pub fn new(pool: SqlitePool, outbound_buffer: usize) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomManager::new(),
            presence: PresenceTracker::new(),
            threads: DmThreads::new(pool),
            user_locks: KeyedLocks::new(),
            thread_locks: KeyedLocks::new(),
            outbound_buffer,
            shutdown,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn threads(&self) -> &DmThreads {
        &self.threads
    }

    pub fn pool(&self) -> &SqlitePool {
        self.threads.pool()
    }

    /// Every user that is not offline
    pub fn online_users(&self) -> Vec<PresenceEntry> {
        self.presence.snapshot()
    }

    /// Resolves once `shutdown` has been called
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Tear down all live state: close sockets, drop rooms, reset presence
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let dropped = self.registry.clear();
        self.rooms.clear();
        self.presence.reset_all();
        info!("[Realtime] Hub shut down, dropped {} connections", dropped.len());
    }
}
