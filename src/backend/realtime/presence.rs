/**
 * Presence State Machine
 *
 * Tracks each user's coarse availability. Transitions:
 *
 * ```text
 * offline --first connection--> online   (or dnd if the user left while in dnd)
 * online  --idle--------------> away
 * away    --activity----------> online
 * any     --explicit set------> online | away | dnd
 * any     --last connection---> offline
 * ```
 *
 * `dnd` is only left through an explicit status change; idle and activity
 * signals never touch it.
 *
 * Every method returns the transition it performed, or `None` when the status
 * did not change, so callers broadcast exactly once per real change.
 * Presence is not persisted: a fresh tracker knows every user as offline.
 */

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::{PresenceEntry, PresenceStatus, RequestedStatus, ServerEvent};

/// A status transition that must be broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChange {
    pub user_id: Uuid,
    pub from: PresenceStatus,
    pub to: PresenceStatus,
    pub at: DateTime<Utc>,
}

impl PresenceChange {
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::StatusChange {
            user_id: self.user_id,
            status: self.to,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PresenceRecord {
    status: PresenceStatus,
    since: DateTime<Utc>,
    /// Come back as dnd on the next first connection
    restore_dnd: bool,
}

impl Default for PresenceRecord {
    fn default() -> Self {
        Self {
            status: PresenceStatus::Offline,
            since: Utc::now(),
            restore_dnd: false,
        }
    }
}

/// Per-user presence, owned by the hub
#[derive(Default)]
pub struct PresenceTracker {
    records: Mutex<HashMap<Uuid, PresenceRecord>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PresenceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, user_id: Uuid, apply: impl FnOnce(&mut PresenceRecord) -> Option<PresenceStatus>) -> Option<PresenceChange> {
        let mut records = self.lock();
        let record = records.entry(user_id).or_default();
        let from = record.status;
        let to = apply(record)?;
        if to == from {
            return None;
        }

        let at = Utc::now();
        record.status = to;
        record.since = at;
        Some(PresenceChange { user_id, from, to, at })
    }

    /// The user's first connection was registered
    pub fn connected(&self, user_id: Uuid) -> Option<PresenceChange> {
        self.transition(user_id, |record| {
            if !record.status.is_offline() {
                return None;
            }
            Some(if record.restore_dnd {
                PresenceStatus::Dnd
            } else {
                PresenceStatus::Online
            })
        })
    }

    /// The user's last connection was removed
    pub fn disconnected(&self, user_id: Uuid) -> Option<PresenceChange> {
        self.transition(user_id, |record| {
            if !record.status.is_offline() {
                record.restore_dnd = record.status == PresenceStatus::Dnd;
            }
            Some(PresenceStatus::Offline)
        })
    }

    /// Explicit status chosen by the user
    ///
    /// Ignored for users that are not connected, since their status is
    /// derived from the connection count.
    pub fn set_status(&self, user_id: Uuid, requested: RequestedStatus) -> Option<PresenceChange> {
        self.transition(user_id, |record| {
            if record.status.is_offline() {
                return None;
            }
            let status = PresenceStatus::from(requested);
            record.restore_dnd = status == PresenceStatus::Dnd;
            Some(status)
        })
    }

    /// Client inactivity timer elapsed
    pub fn idle(&self, user_id: Uuid) -> Option<PresenceChange> {
        self.transition(user_id, |record| {
            (record.status == PresenceStatus::Online).then_some(PresenceStatus::Away)
        })
    }

    /// Client saw activity again
    pub fn activity(&self, user_id: Uuid) -> Option<PresenceChange> {
        self.transition(user_id, |record| {
            (record.status == PresenceStatus::Away).then_some(PresenceStatus::Online)
        })
    }

    pub fn status_of(&self, user_id: Uuid) -> PresenceStatus {
        self.lock()
            .get(&user_id)
            .map_or(PresenceStatus::Offline, |record| record.status)
    }

    /// Every user that is not offline, ordered by user id
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        let mut entries: Vec<PresenceEntry> = self
            .lock()
            .iter()
            .filter(|(_, record)| !record.status.is_offline())
            .map(|(user_id, record)| PresenceEntry {
                user_id: *user_id,
                status: record.status,
                since: record.since,
            })
            .collect();
        entries.sort_by_key(|entry| entry.user_id);
        entries
    }

    /// Mark everyone offline (shutdown)
    pub fn reset_all(&self) {
        let now = Utc::now();
        for record in self.lock().values_mut() {
            record.status = PresenceStatus::Offline;
            record.since = now;
        }
    }
}
