/**
 * Event Fan-out Helpers
 *
 * Thin helpers for the two delivery shapes that are not a single room:
 *
 * - global broadcast to every live connection (presence changes, channel deletion)
 * - targeted delivery to a set of users through their `user:<id>` rooms
 *
 * Delivery is best effort: events for connections whose outbound queue is
 * full or closed are dropped and logged by `ConnectionHandle::deliver`.
 */

use uuid::Uuid;

use super::connections::ConnectionRegistry;
use super::rooms::{RoomId, RoomManager};
use crate::shared::ServerEvent;

/// Deliver an event to every live connection
///
/// # Returns
///
/// Number of connections the event was queued for
pub fn broadcast_all(registry: &ConnectionRegistry, event: &ServerEvent) -> usize {
    let connections = registry.all();
    let delivered = connections
        .iter()
        .filter(|handle| handle.deliver(event.clone()))
        .count();

    tracing::debug!(
        "[Realtime] {} broadcast to {}/{} connections",
        event.name(),
        delivered,
        connections.len()
    );
    delivered
}

/// Deliver an event to the notification room of each user
///
/// # Returns
///
/// Number of connections the event was queued for, across all users
pub fn notify_users<I>(rooms: &RoomManager, users: I, event: &ServerEvent) -> usize
where
    I: IntoIterator<Item = Uuid>,
{
    users
        .into_iter()
        .map(|user_id| rooms.publish(RoomId::User(user_id), event))
        .sum()
}
