//! Connect / disconnect and presence

use assert_matches::assert_matches;
use chatflow::backend::error::BackendError;
use chatflow::backend::realtime::RoomId;
use chatflow::shared::{ClientEvent, PresenceStatus, RequestedStatus, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::*;

#[tokio::test]
async fn test_first_connection_announces_online_once() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let (_observer, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut bob_rx);

    let (first, mut first_rx) = assert_ok!(hub.connect(alice.id).await);
    assert_eq!(
        drain(&mut bob_rx),
        vec![ServerEvent::StatusChange {
            user_id: alice.id,
            status: PresenceStatus::Online,
        }]
    );
    // own status change, then the snapshot
    assert_eq!(drain_names(&mut first_rx), vec!["status_change", "initial_status_list"]);

    let (second, mut second_rx) = assert_ok!(hub.connect(alice.id).await);
    assert_silent(&mut bob_rx);
    assert_eq!(drain_names(&mut second_rx), vec!["initial_status_list"]);
    assert_eq!(hub.registry().connection_count(alice.id), 2);

    hub.disconnect(first.id()).await;
    assert_silent(&mut bob_rx);
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Online);

    hub.disconnect(second.id()).await;
    assert_eq!(
        drain(&mut bob_rx),
        vec![ServerEvent::StatusChange {
            user_id: alice.id,
            status: PresenceStatus::Offline,
        }]
    );
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Offline);
    assert!(!hub.registry().is_online(alice.id));
}

#[tokio::test]
async fn test_snapshot_lists_non_offline_users() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let carol = create_test_user(db.pool(), "carol").await;

    let (_a, _a_rx) = assert_ok!(hub.connect(alice.id).await);
    hub.set_status(alice.id, RequestedStatus::Dnd).await;

    let (c, _c_rx) = assert_ok!(hub.connect(carol.id).await);
    hub.disconnect(c.id()).await;

    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    let snapshot = drain(&mut bob_rx)
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::PresenceSnapshot { users } => Some(users),
            _ => None,
        })
        .expect("snapshot delivered on connect");

    let statuses: Vec<_> = snapshot.iter().map(|e| (e.user_id, e.status)).collect();
    assert!(statuses.contains(&(alice.id, PresenceStatus::Dnd)));
    assert!(statuses.contains(&(bob.id, PresenceStatus::Online)));
    assert!(!statuses.iter().any(|(id, _)| *id == carol.id));
}

#[tokio::test]
async fn test_disconnect_leaves_every_room() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    let channel = assert_ok!(hub.create_channel(alice.id, "general", None).await);

    let (conn, _rx) = assert_ok!(hub.connect(alice.id).await);
    assert_ok!(hub.dispatch(&conn, ClientEvent::JoinThread { thread_id }).await);
    assert_ok!(
        hub.dispatch(&conn, ClientEvent::JoinChannel { channel_id: channel.id })
            .await
    );
    assert_eq!(hub.rooms().rooms_of(conn.id()).len(), 3);

    hub.disconnect(conn.id()).await;

    assert!(hub.rooms().rooms_of(conn.id()).is_empty());
    assert!(hub.rooms().members(RoomId::Thread(thread_id)).is_empty());
    assert!(hub.registry().get(conn.id()).is_none());

    // a second disconnect is a no-op
    hub.disconnect(conn.id()).await;
}

#[tokio::test]
async fn test_dnd_survives_reconnect() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;

    let (conn, _rx) = assert_ok!(hub.connect(alice.id).await);
    hub.set_status(alice.id, RequestedStatus::Dnd).await;
    hub.disconnect(conn.id()).await;
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Offline);

    let (_conn, _rx) = assert_ok!(hub.connect(alice.id).await);
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Dnd);
}

#[tokio::test]
async fn test_idle_and_activity_leave_dnd_alone() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let (conn, mut rx) = assert_ok!(hub.connect(alice.id).await);
    drain(&mut rx);

    assert_ok!(hub.dispatch(&conn, ClientEvent::Idle).await);
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Away);
    assert_ok!(hub.dispatch(&conn, ClientEvent::Activity).await);
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Online);
    assert_eq!(drain_names(&mut rx), vec!["status_change", "status_change"]);

    assert_ok!(
        hub.dispatch(&conn, ClientEvent::SetStatus { status: RequestedStatus::Dnd })
            .await
    );
    drain(&mut rx);
    assert_ok!(hub.dispatch(&conn, ClientEvent::Idle).await);
    assert_ok!(hub.dispatch(&conn, ClientEvent::Activity).await);
    assert_eq!(hub.presence().status_of(alice.id), PresenceStatus::Dnd);
    assert_silent(&mut rx);
}

#[tokio::test]
async fn test_presence_list_resends_snapshot() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let (conn, mut rx) = assert_ok!(hub.connect(alice.id).await);
    drain(&mut rx);

    assert_ok!(hub.dispatch(&conn, ClientEvent::PresenceList).await);
    assert_eq!(drain_names(&mut rx), vec!["initial_status_list"]);
}

#[tokio::test]
async fn test_shutdown_drops_everything() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let (_conn, _rx) = assert_ok!(hub.connect(alice.id).await);
    let mut signal = hub.shutdown_signal();

    hub.shutdown();

    assert!(signal.has_changed().unwrap_or(false));
    assert!(hub.registry().is_empty());
    assert!(hub.online_users().is_empty());
    assert_matches!(hub.connect(alice.id).await, Err(BackendError::StateError { .. }));
}
