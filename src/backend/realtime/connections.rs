/**
 * Connection Registry
 *
 * Maps each user to the set of live connections they currently hold. A user
 * with three open tabs is online until all three are closed.
 *
 * # Connection Handles
 *
 * A `ConnectionHandle` is the sending half of a connection's bounded outbound
 * queue plus its identity. Delivery never blocks: when a slow client's queue
 * is full the event is dropped for that connection and a warning is logged,
 * which keeps one stalled socket from holding up fan-out to everyone else.
 *
 * # Thread Safety
 *
 * All state sits behind one `std::sync::Mutex`. Critical sections are short
 * map updates and never await, so a blocking mutex is cheaper than an async
 * one here.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::ServerEvent;

/// Opaque identifier of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// A live connection: identity, owner and outbound queue
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: Uuid,
    opened_at: DateTime<Utc>,
    outbound: mpsc::Sender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle together with the receiving end of its outbound queue
    pub fn channel(user_id: Uuid, capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            user_id,
            opened_at: Utc::now(),
            outbound,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Queue an event for this connection without waiting
    ///
    /// Returns `false` if the event was dropped.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    "[Realtime] Outbound queue full for {} (user {}), dropping {}",
                    self.id,
                    self.user_id,
                    event.name()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("[Realtime] {} already closed", self.id);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Result of removing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deregistered {
    pub user_id: Uuid,
    /// Connections the user still holds
    pub remaining: usize,
}

#[derive(Default)]
struct RegistryInner {
    by_connection: HashMap<ConnectionId, ConnectionHandle>,
    by_user: HashMap<Uuid, HashSet<ConnectionId>>,
}

/// Process-wide map of users to live connections
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection; returns how many connections the user now holds
    ///
    /// Registering the same handle twice is an error.
    pub fn register(&self, handle: ConnectionHandle) -> Result<usize, BackendError> {
        let mut inner = self.lock();
        if inner.by_connection.contains_key(&handle.id) {
            return Err(BackendError::state(format!(
                "{} is already registered",
                handle.id
            )));
        }

        let user_id = handle.user_id;
        let id = handle.id;
        inner.by_connection.insert(id, handle);
        let set = inner.by_user.entry(user_id).or_default();
        set.insert(id);
        Ok(set.len())
    }

    /// Remove a connection; unknown handles are ignored
    pub fn deregister(&self, id: ConnectionId) -> Option<Deregistered> {
        let mut inner = self.lock();
        let handle = inner.by_connection.remove(&id)?;

        let remaining = match inner.by_user.get_mut(&handle.user_id) {
            Some(set) => {
                set.remove(&id);
                set.len()
            }
            None => 0,
        };
        if remaining == 0 {
            inner.by_user.remove(&handle.user_id);
        }

        Some(Deregistered {
            user_id: handle.user_id,
            remaining,
        })
    }

    pub fn get(&self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.lock().by_connection.get(&id).cloned()
    }

    pub fn connections_of(&self, user_id: Uuid) -> Vec<ConnectionHandle> {
        let inner = self.lock();
        inner
            .by_user
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_connection.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.lock().by_user.get(&user_id).map_or(0, HashSet::len)
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connection_count(user_id) > 0
    }

    pub fn online_users(&self) -> Vec<Uuid> {
        self.lock().by_user.keys().copied().collect()
    }

    /// Snapshot of every live connection
    pub fn all(&self) -> Vec<ConnectionHandle> {
        self.lock().by_connection.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().by_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every connection, returning the removed handles
    pub fn clear(&self) -> Vec<ConnectionHandle> {
        let mut inner = self.lock();
        inner.by_user.clear();
        inner.by_connection.drain().map(|(_, handle)| handle).collect()
    }
}
