/**
 * Event Fan-out Dispatcher
 *
 * Routes inbound client events to persistence and then to the right rooms.
 * The operations below are also what the REST handlers call, so a message
 * sent over HTTP produces exactly the same fan-out as one sent over the
 * socket.
 *
 * # Fan-out Targets
 *
 * | Event              | Persisted           | Delivered to                               |
 * |--------------------|---------------------|--------------------------------------------|
 * | channel message    | insert              | channel room (sender included)             |
 * | dm message         | append + resurrect  | `user:<id>` of every participant           |
 * | dm typing          | nothing             | thread room, minus the typing user         |
 * | dm mark read       | read pointer        | `user:<id>` of the other participants      |
 * | dm delete message  | soft delete         | `user:<id>` of every participant           |
 * | dm delete thread   | hide for requester  | `user:<id>` of the requester only          |
 * | status change      | nothing             | every connection                           |
 *
 * # Ordering
 *
 * Persistence always completes before the event is published, so a client
 * that re-fetches history after a live event sees it. DM operations hold the
 * thread's lock from the store call through publication, which keeps the
 * published order equal to the applied order for that thread.
 */

use tracing::{debug, info};
use uuid::Uuid;

use super::broadcast::{broadcast_all, notify_users};
use super::connections::ConnectionHandle;
use super::hub::RealtimeHub;
use super::presence::PresenceChange;
use super::rooms::RoomId;
use crate::backend::auth::users;
use crate::backend::chat::db as channels;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::threads::{DeleteOutcome, ReadOutcome};
use crate::shared::error::require_content;
use crate::shared::messaging::{
    Channel, ChannelMessage, DmMessage, ListMessagesParams, ListMessagesResponse, ThreadSummary,
    UserSummary, UserWithStatus,
};
use crate::shared::{ClientEvent, RequestedStatus, ServerEvent};

impl RealtimeHub {
    /// Handle one event from a connection
    ///
    /// Errors are returned to the caller, which reports them to this
    /// connection only.
    pub async fn dispatch(&self, conn: &ConnectionHandle, event: ClientEvent) -> BackendResult<()> {
        let user_id = conn.user_id();
        debug!("[Realtime] {} from {}", event.name(), conn.id());

        match event {
            ClientEvent::JoinChannel { channel_id } => self.join_channel(conn, channel_id).await,
            ClientEvent::LeaveChannel { channel_id } => {
                self.rooms.leave(RoomId::Channel(channel_id), conn.id());
                Ok(())
            }
            ClientEvent::SendChannelMessage { channel_id, content } => self
                .send_channel_message(user_id, channel_id, &content)
                .await
                .map(drop),
            ClientEvent::SetStatus { status } => {
                self.set_status(user_id, status).await;
                Ok(())
            }
            ClientEvent::Idle => {
                self.idle(user_id).await;
                Ok(())
            }
            ClientEvent::Activity => {
                self.activity(user_id).await;
                Ok(())
            }
            ClientEvent::PresenceList => {
                conn.deliver(ServerEvent::PresenceSnapshot {
                    users: self.presence.snapshot(),
                });
                Ok(())
            }
            ClientEvent::JoinThread { thread_id } => self.join_thread(conn, thread_id).await,
            ClientEvent::LeaveThread { thread_id } => {
                self.rooms.leave(RoomId::Thread(thread_id), conn.id());
                Ok(())
            }
            ClientEvent::Typing { thread_id } => self.typing(conn, thread_id, true).await,
            ClientEvent::StopTyping { thread_id } => self.typing(conn, thread_id, false).await,
            ClientEvent::SendDirectMessage { thread_id, content } => self
                .send_direct_message(user_id, thread_id, &content)
                .await
                .map(drop),
            ClientEvent::MarkRead { thread_id, last_read_message_id } => self
                .mark_read(user_id, thread_id, last_read_message_id)
                .await
                .map(drop),
            ClientEvent::DeleteMessage { thread_id, message_id } => {
                self.delete_direct_message(user_id, thread_id, message_id).await
            }
            ClientEvent::DeleteThread { thread_id } => self.delete_thread(user_id, thread_id).await,
        }
    }

    // --- presence -------------------------------------------------------

    async fn apply_presence(&self, user_id: Uuid, change: impl FnOnce() -> Option<PresenceChange>) {
        let _guard = self.user_locks.lock(user_id).await;
        if let Some(change) = change() {
            info!("[Presence] {} is now {}", user_id, change.to);
            broadcast_all(&self.registry, &change.to_event());
        }
    }

    /// Explicit status chosen by the user
    pub async fn set_status(&self, user_id: Uuid, status: RequestedStatus) {
        self.apply_presence(user_id, || self.presence.set_status(user_id, status))
            .await;
    }

    /// Client inactivity timer elapsed
    pub async fn idle(&self, user_id: Uuid) {
        self.apply_presence(user_id, || self.presence.idle(user_id)).await;
    }

    /// Client activity resumed
    pub async fn activity(&self, user_id: Uuid) {
        self.apply_presence(user_id, || self.presence.activity(user_id))
            .await;
    }

    // --- channels -------------------------------------------------------

    async fn join_channel(&self, conn: &ConnectionHandle, channel_id: Uuid) -> BackendResult<()> {
        if !channels::channel_exists(self.pool(), channel_id).await? {
            return Err(BackendError::not_found("Channel"));
        }
        self.rooms.join(RoomId::Channel(channel_id), conn);
        Ok(())
    }

    pub async fn create_channel(
        &self,
        user_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> BackendResult<Channel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BackendError::validation("name", "channel name cannot be empty"));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let channel = channels::create_channel(self.pool(), name, description, user_id).await?;
        info!("[Channels] {} created channel {} ({})", user_id, channel.id, channel.name);
        Ok(channel)
    }

    pub async fn list_channels(&self) -> BackendResult<Vec<Channel>> {
        Ok(channels::list_channels(self.pool()).await?)
    }

    pub async fn list_channel_messages(
        &self,
        channel_id: Uuid,
        params: &ListMessagesParams,
    ) -> BackendResult<Vec<ChannelMessage>> {
        if !channels::channel_exists(self.pool(), channel_id).await? {
            return Err(BackendError::not_found("Channel"));
        }
        Ok(channels::list_channel_messages(self.pool(), channel_id, params.limit(), params.offset()).await?)
    }

    pub async fn channel_members(&self, channel_id: Uuid) -> BackendResult<Vec<UserWithStatus>> {
        if !channels::channel_exists(self.pool(), channel_id).await? {
            return Err(BackendError::not_found("Channel"));
        }
        let members = channels::channel_members(self.pool(), channel_id).await?;
        Ok(members.into_iter().map(|profile| self.with_status(profile)).collect())
    }

    /// Persist a channel message and publish it to the channel room
    pub async fn send_channel_message(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
        content: &str,
    ) -> BackendResult<ChannelMessage> {
        require_content(content)?;
        if !channels::channel_exists(self.pool(), channel_id).await? {
            return Err(BackendError::not_found("Channel"));
        }
        let author = self.profile(user_id).await?;

        let message = channels::insert_channel_message(self.pool(), channel_id, &author, content).await?;
        self.rooms.publish(
            RoomId::Channel(channel_id),
            &ServerEvent::ChannelMessage {
                channel_id,
                message: message.clone(),
            },
        );
        Ok(message)
    }

    /// Delete a channel with its messages, tell everyone and close its room
    pub async fn delete_channel(&self, user_id: Uuid, channel_id: Uuid) -> BackendResult<()> {
        let owner = channels::channel_owner(self.pool(), channel_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Channel"))?;
        if owner.is_some_and(|owner| owner != user_id) {
            return Err(BackendError::authorization("Only the channel creator can delete it"));
        }

        if !channels::delete_channel(self.pool(), channel_id).await? {
            return Err(BackendError::not_found("Channel"));
        }
        info!("[Channels] {} deleted channel {}", user_id, channel_id);

        broadcast_all(&self.registry, &ServerEvent::ChannelDeleted { channel_id });
        self.rooms.close(RoomId::Channel(channel_id));
        Ok(())
    }

    // --- direct messages ------------------------------------------------

    /// Open (or reopen) the thread between `user_id` and `target_id`
    ///
    /// A thread the caller had hidden becomes visible to the caller again;
    /// the other participant's visibility is left alone.
    pub async fn start_thread(&self, user_id: Uuid, target_id: Uuid) -> BackendResult<Uuid> {
        let thread_id = self.threads.get_or_create(user_id, target_id).await?;
        let _guard = self.thread_locks.lock(thread_id).await;
        self.threads.show(thread_id, user_id).await?;
        Ok(thread_id)
    }

    /// Threads visible to the user, with the other participant's live status
    pub async fn list_threads(&self, user_id: Uuid) -> BackendResult<Vec<ThreadSummary>> {
        let rows = self.threads.list_visible(user_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| ThreadSummary {
                thread_id: row.thread_id,
                other_user: self.with_status(row.other_user),
                last_message: row.last_message,
                last_message_at: row.last_message_at,
                unread_count: u32::try_from(row.unread_count).unwrap_or(u32::MAX),
            })
            .collect())
    }

    pub async fn list_direct_messages(
        &self,
        user_id: Uuid,
        thread_id: Uuid,
        params: &ListMessagesParams,
    ) -> BackendResult<ListMessagesResponse> {
        self.threads.list_messages(thread_id, user_id, params).await
    }

    async fn join_thread(&self, conn: &ConnectionHandle, thread_id: Uuid) -> BackendResult<()> {
        self.threads.require_participant(thread_id, conn.user_id()).await?;
        self.rooms.join(RoomId::Thread(thread_id), conn);
        Ok(())
    }

    /// Relay typing state to the thread room, never back to the typing user
    async fn typing(&self, conn: &ConnectionHandle, thread_id: Uuid, typing: bool) -> BackendResult<()> {
        let room = RoomId::Thread(thread_id);
        let user_id = conn.user_id();

        // joining the room already required participation
        if !self.rooms.is_member(room, conn.id()) {
            self.threads.require_participant(thread_id, user_id).await?;
        }

        let event = if typing {
            ServerEvent::Typing { thread_id, user_id }
        } else {
            ServerEvent::StopTyping { thread_id, user_id }
        };
        self.rooms
            .publish_filtered(room, &event, |member| member.user_id() != user_id);
        Ok(())
    }

    /// Persist a DM and deliver it to every participant's devices
    pub async fn send_direct_message(
        &self,
        sender_id: Uuid,
        thread_id: Uuid,
        content: &str,
    ) -> BackendResult<DmMessage> {
        require_content(content)?;
        let _guard = self.thread_locks.lock(thread_id).await;

        let (message, participants) = self
            .threads
            .append_message(thread_id, sender_id, content)
            .await?;

        let delivered = notify_users(
            &self.rooms,
            participants,
            &ServerEvent::DirectMessage {
                thread_id,
                message: message.clone(),
            },
        );
        debug!("[DM] Message {} delivered to {} connections", message.id, delivered);
        Ok(message)
    }

    /// Move the caller's read pointer and send a receipt to the other side
    ///
    /// Returns whether the pointer moved.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        thread_id: Uuid,
        last_read_message_id: Uuid,
    ) -> BackendResult<bool> {
        let _guard = self.thread_locks.lock(thread_id).await;

        match self.threads.mark_read(thread_id, user_id, last_read_message_id).await? {
            ReadOutcome::Updated { read_at, participants } => {
                let others = participants.into_iter().filter(|id| *id != user_id);
                notify_users(
                    &self.rooms,
                    others,
                    &ServerEvent::ReadReceipt {
                        thread_id,
                        user_id,
                        last_read_message_id,
                        read_at,
                    },
                );
                Ok(true)
            }
            ReadOutcome::Unchanged => {
                debug!("[DM] Ignoring backward read pointer from {} in {}", user_id, thread_id);
                Ok(false)
            }
        }
    }

    /// Soft delete a DM; only the first successful delete is announced
    pub async fn delete_direct_message(
        &self,
        user_id: Uuid,
        thread_id: Uuid,
        message_id: Uuid,
    ) -> BackendResult<()> {
        let _guard = self.thread_locks.lock(thread_id).await;

        match self.threads.soft_delete(thread_id, message_id, user_id).await? {
            DeleteOutcome::Deleted { participants } => {
                notify_users(
                    &self.rooms,
                    participants,
                    &ServerEvent::MessageDeleted { thread_id, message_id },
                );
            }
            DeleteOutcome::AlreadyDeleted => {
                debug!("[DM] Message {} already deleted", message_id);
            }
        }
        Ok(())
    }

    /// Hide a thread for the requester only; the requester is always told
    pub async fn delete_thread(&self, user_id: Uuid, thread_id: Uuid) -> BackendResult<()> {
        let _guard = self.thread_locks.lock(thread_id).await;

        if !self.threads.hide(thread_id, user_id).await? {
            debug!("[DM] Thread {} was already hidden for {}", thread_id, user_id);
        }
        notify_users(&self.rooms, [user_id], &ServerEvent::ThreadDeleted { thread_id });
        Ok(())
    }

    // --- helpers --------------------------------------------------------

    async fn profile(&self, user_id: Uuid) -> BackendResult<UserSummary> {
        users::get_user_by_id(self.pool(), user_id)
            .await?
            .map(|user| user.summary())
            .ok_or_else(|| BackendError::not_found("User"))
    }

    fn with_status(&self, profile: UserSummary) -> UserWithStatus {
        let status = self.presence.status_of(profile.id);
        UserWithStatus { profile, status }
    }
}
