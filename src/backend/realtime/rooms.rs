/**
 * Room Membership
 *
 * A room is a named set of connections that receive a common broadcast:
 * a channel, a DM thread (`thread:<id>`) or a user's private notification
 * room (`user:<id>`). Rooms are created on first join and removed as soon as
 * their last member leaves.
 *
 * # Indexes
 *
 * Two maps are kept in step: room → members and connection → rooms. The
 * second one lets `leave_all` run in O(rooms of the connection) on
 * disconnect instead of scanning every room.
 *
 * # Publishing
 *
 * `publish` copies the member list under the lock and delivers after
 * releasing it. A connection that joins after the copy is taken does not
 * receive that event.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::connections::{ConnectionHandle, ConnectionId};
use crate::shared::ServerEvent;

/// Identifier of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    Channel(Uuid),
    Thread(Uuid),
    User(Uuid),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Channel(id) => write!(f, "{id}"),
            RoomId::Thread(id) => write!(f, "thread:{id}"),
            RoomId::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[derive(Default)]
struct RoomsInner {
    rooms: HashMap<RoomId, HashMap<ConnectionId, ConnectionHandle>>,
    memberships: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomsInner {
    fn remove_member(&mut self, room: RoomId, id: ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(&room) else {
            return false;
        };
        let removed = members.remove(&id).is_some();
        if members.is_empty() {
            self.rooms.remove(&room);
        }
        removed
    }
}

/// Process-wide room membership
#[derive(Default)]
pub struct RoomManager {
    inner: Mutex<RoomsInner>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RoomsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe a connection; returns `false` if it was already a member
    pub fn join(&self, room: RoomId, handle: &ConnectionHandle) -> bool {
        let mut inner = self.lock();
        let joined = inner
            .rooms
            .entry(room)
            .or_default()
            .insert(handle.id(), handle.clone())
            .is_none();
        inner.memberships.entry(handle.id()).or_default().insert(room);
        joined
    }

    /// Unsubscribe a connection; returns `false` if it was not a member
    pub fn leave(&self, room: RoomId, id: ConnectionId) -> bool {
        let mut inner = self.lock();
        if let Some(rooms) = inner.memberships.get_mut(&id) {
            rooms.remove(&room);
            if rooms.is_empty() {
                inner.memberships.remove(&id);
            }
        }
        inner.remove_member(room, id)
    }

    /// Remove a connection from every room it is in; returns how many
    pub fn leave_all(&self, id: ConnectionId) -> usize {
        let mut inner = self.lock();
        let Some(rooms) = inner.memberships.remove(&id) else {
            return 0;
        };
        let count = rooms.len();
        for room in rooms {
            inner.remove_member(room, id);
        }
        count
    }

    /// Remove a room and all of its memberships
    pub fn close(&self, room: RoomId) -> usize {
        let mut inner = self.lock();
        let Some(members) = inner.rooms.remove(&room) else {
            return 0;
        };
        for id in members.keys() {
            if let Some(rooms) = inner.memberships.get_mut(id) {
                rooms.remove(&room);
                if rooms.is_empty() {
                    inner.memberships.remove(id);
                }
            }
        }
        members.len()
    }

    pub fn is_member(&self, room: RoomId, id: ConnectionId) -> bool {
        self.lock()
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains_key(&id))
    }

    /// Snapshot of the current members of a room
    pub fn members(&self, room: RoomId) -> Vec<ConnectionHandle> {
        self.lock()
            .rooms
            .get(&room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, id: ConnectionId) -> Vec<RoomId> {
        self.lock()
            .memberships
            .get(&id)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Deliver an event to every current member; returns deliveries made
    pub fn publish(&self, room: RoomId, event: &ServerEvent) -> usize {
        self.publish_filtered(room, event, |_| true)
    }

    /// Deliver to the current members for which `include` returns true
    pub fn publish_filtered<F>(&self, room: RoomId, event: &ServerEvent, include: F) -> usize
    where
        F: Fn(&ConnectionHandle) -> bool,
    {
        let members = self.members(room);
        let delivered = members
            .iter()
            .filter(|handle| include(handle))
            .filter(|handle| handle.deliver(event.clone()))
            .count();

        tracing::debug!(
            "[Realtime] {} published to {} ({}/{} connections)",
            event.name(),
            room,
            delivered,
            members.len()
        );
        delivered
    }

    /// Drop every room and membership
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.rooms.clear();
        inner.memberships.clear();
    }
}
