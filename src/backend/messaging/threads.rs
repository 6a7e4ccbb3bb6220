/**
 * DM Thread Lifecycle
 *
 * Owns the rules of direct-message threads on top of the database:
 *
 * - exactly one thread per unordered pair of users (`get_or_create`)
 * - per-participant visibility (`hide`) that never affects the other side
 * - resurrection: a new message makes the thread visible for both participants
 * - sender-only, idempotent soft delete
 * - monotonic read pointers
 *
 * The database is the only source of truth; nothing is cached between calls.
 * Live fan-out is not done here but by the dispatcher, after these
 * operations return.
 */

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::db;
use crate::backend::auth::users;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::lock::KeyedLocks;
use crate::shared::error::require_content;
use crate::shared::messaging::{DmMessage, ListMessagesParams, ListMessagesResponse};

pub use super::db::ThreadRow;

/// Outcome of a soft delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The message was flagged now; participants must be told
    Deleted { participants: Vec<Uuid> },
    /// The message was already flagged; nothing to announce
    AlreadyDeleted,
}

/// Outcome of moving a read pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Updated {
        read_at: chrono::DateTime<chrono::Utc>,
        participants: Vec<Uuid>,
    },
    /// The pointer already was at or past that message
    Unchanged,
}

/// Thread lifecycle manager
pub struct DmThreads {
    pool: SqlitePool,
    pair_locks: KeyedLocks<(Uuid, Uuid)>,
}

impl DmThreads {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pair_locks: KeyedLocks::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Return the thread between two users, creating it on first contact
    pub async fn get_or_create(&self, user_id: Uuid, target_id: Uuid) -> BackendResult<Uuid> {
        if user_id == target_id {
            return Err(BackendError::validation(
                "targetUserId",
                "cannot start a conversation with yourself",
            ));
        }
        if let Some(thread_id) = db::find_thread_by_pair(&self.pool, user_id, target_id).await? {
            return Ok(thread_id);
        }
        if !users::user_exists(&self.pool, target_id).await? {
            return Err(BackendError::validation("targetUserId", "unknown user"));
        }

        let _guard = self.pair_locks.lock(db::ordered_pair(user_id, target_id)).await;
        if let Some(thread_id) = db::find_thread_by_pair(&self.pool, user_id, target_id).await? {
            return Ok(thread_id);
        }

        self.create_or_reuse(user_id, target_id).await
    }

    /// Insert the pair's thread, or return the one another writer stored first
    ///
    /// The pair lock only covers this process; the unique pair index decides
    /// between writers sharing the database.
    pub async fn create_or_reuse(&self, user_id: Uuid, target_id: Uuid) -> BackendResult<Uuid> {
        match self.create(user_id, target_id).await {
            Ok(thread_id) => {
                info!("[DM] Created thread {} for {} and {}", thread_id, user_id, target_id);
                Ok(thread_id)
            }
            Err(BackendError::ConflictError { .. }) => {
                debug!("[DM] Lost creation race for {} / {}, re-reading", user_id, target_id);
                db::find_thread_by_pair(&self.pool, user_id, target_id)
                    .await?
                    .ok_or_else(|| BackendError::conflict("thread creation raced and no thread was found"))
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, user_id: Uuid, target_id: Uuid) -> BackendResult<Uuid> {
        db::create_thread(&self.pool, user_id, target_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    BackendError::conflict("a thread already exists for this pair")
                }
                other => BackendError::from(other),
            })
    }

    /// Participants of a thread, provided `user_id` is one of them
    pub async fn require_participant(&self, thread_id: Uuid, user_id: Uuid) -> BackendResult<Vec<Uuid>> {
        let participants = db::thread_participants(&self.pool, thread_id).await?;
        if participants.is_empty() {
            return Err(BackendError::not_found("Thread"));
        }
        if !participants.contains(&user_id) {
            return Err(BackendError::authorization("Not a participant of this thread"));
        }
        Ok(participants)
    }

    /// Threads visible to `user_id`
    pub async fn list_visible(&self, user_id: Uuid) -> BackendResult<Vec<ThreadRow>> {
        Ok(db::list_visible_threads(&self.pool, user_id).await?)
    }

    /// Hide a thread for one participant; returns whether it was visible
    pub async fn hide(&self, thread_id: Uuid, user_id: Uuid) -> BackendResult<bool> {
        self.require_participant(thread_id, user_id).await?;
        let changed = db::set_visibility(&self.pool, thread_id, user_id, false).await?;
        debug!("[DM] Thread {} hidden for {} (changed: {})", thread_id, user_id, changed);
        Ok(changed)
    }

    /// Make a thread visible again for one participant
    pub async fn show(&self, thread_id: Uuid, user_id: Uuid) -> BackendResult<bool> {
        self.require_participant(thread_id, user_id).await?;
        Ok(db::set_visibility(&self.pool, thread_id, user_id, true).await?)
    }

    /// Persist a message and resurrect the thread for every participant
    ///
    /// Returns the stored message and the participants to notify.
    pub async fn append_message(
        &self,
        thread_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> BackendResult<(DmMessage, Vec<Uuid>)> {
        require_content(content)?;
        let participants = self.require_participant(thread_id, sender_id).await?;
        let sender = users::get_user_by_id(&self.pool, sender_id)
            .await?
            .ok_or_else(|| BackendError::not_found("User"))?;

        let message = db::insert_message(&self.pool, thread_id, &sender.summary(), content).await?;
        debug!("[DM] Stored message {} in thread {}", message.id, thread_id);
        Ok((message, participants))
    }

    /// Soft delete a message; only its sender may do so
    pub async fn soft_delete(
        &self,
        thread_id: Uuid,
        message_id: Uuid,
        requester_id: Uuid,
    ) -> BackendResult<DeleteOutcome> {
        let message = db::find_message(&self.pool, thread_id, message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Message"))?;

        if message.sender_id != requester_id {
            return Err(BackendError::authorization("Only the sender can delete this message"));
        }
        if message.is_deleted {
            return Ok(DeleteOutcome::AlreadyDeleted);
        }

        if !db::mark_deleted(&self.pool, message_id).await? {
            return Ok(DeleteOutcome::AlreadyDeleted);
        }
        let participants = db::thread_participants(&self.pool, thread_id).await?;
        Ok(DeleteOutcome::Deleted { participants })
    }

    /// Move a participant's read pointer forward to `message_id`
    ///
    /// A pointer that would move backwards is left where it is.
    pub async fn mark_read(
        &self,
        thread_id: Uuid,
        user_id: Uuid,
        message_id: Uuid,
    ) -> BackendResult<ReadOutcome> {
        let participants = self.require_participant(thread_id, user_id).await?;
        let target = db::find_message(&self.pool, thread_id, message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Message"))?;

        if let Some(current) = db::read_pointer_seq(&self.pool, thread_id, user_id).await? {
            if target.seq <= current {
                return Ok(ReadOutcome::Unchanged);
            }
        }

        let read_at = chrono::Utc::now();
        db::upsert_read_pointer(&self.pool, thread_id, user_id, message_id, read_at).await?;
        Ok(ReadOutcome::Updated { read_at, participants })
    }

    /// Message history, oldest first, excluding deleted messages
    pub async fn list_messages(
        &self,
        thread_id: Uuid,
        user_id: Uuid,
        params: &ListMessagesParams,
    ) -> BackendResult<ListMessagesResponse> {
        self.require_participant(thread_id, user_id).await?;

        let limit = params.limit();
        let mut messages = db::list_messages(&self.pool, thread_id, limit + 1, params.offset()).await?;
        let has_more = messages.len() as i64 > limit;
        messages.truncate(limit as usize);

        Ok(ListMessagesResponse { messages, has_more })
    }
}
