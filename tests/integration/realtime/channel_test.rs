//! Channel rooms and channel fan-out

use assert_matches::assert_matches;
use chatflow::backend::error::BackendError;
use chatflow::backend::realtime::RoomId;
use chatflow::shared::messaging::ListMessagesParams;
use chatflow::shared::{ClientEvent, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::*;

#[tokio::test]
async fn test_channel_messages_reach_room_members_only() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let carol = create_test_user(db.pool(), "carol").await;
    let channel = assert_ok!(hub.create_channel(alice.id, "general", Some("everyone")).await);

    let (a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    let (_c, mut carol_rx) = assert_ok!(hub.connect(carol.id).await);
    for conn in [&a, &b] {
        assert_ok!(
            hub.dispatch(conn, ClientEvent::JoinChannel { channel_id: channel.id })
                .await
        );
    }
    drain(&mut alice_rx);
    drain(&mut bob_rx);
    drain(&mut carol_rx);

    assert_ok!(
        hub.dispatch(
            &a,
            ClientEvent::SendChannelMessage {
                channel_id: channel.id,
                content: " hello all ".to_string(),
            },
        )
        .await
    );

    for rx in [&mut alice_rx, &mut bob_rx] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        assert_matches!(
            &events[0],
            ServerEvent::ChannelMessage { message, .. } if message.content == " hello all "
        );
    }
    assert_silent(&mut carol_rx);

    assert_ok!(
        hub.dispatch(&b, ClientEvent::LeaveChannel { channel_id: channel.id })
            .await
    );
    assert_ok!(hub.send_channel_message(alice.id, channel.id, "bob left").await);
    assert_silent(&mut bob_rx);
    assert_eq!(drain_names(&mut alice_rx), vec!["receive_message"]);

    let history = assert_ok!(
        hub.list_channel_messages(channel.id, &ListMessagesParams::default())
            .await
    );
    assert_eq!(history.len(), 2);
    let members = assert_ok!(hub.channel_members(channel.id).await);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].profile.id, alice.id);
}

#[tokio::test]
async fn test_joining_unknown_channel_fails() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let (a, _rx) = assert_ok!(hub.connect(alice.id).await);

    assert_matches!(
        hub.dispatch(&a, ClientEvent::JoinChannel { channel_id: uuid::Uuid::new_v4() })
            .await,
        Err(BackendError::NotFoundError { .. })
    );
    assert_code!(hub.create_channel(alice.id, "   ", None).await, "validation_error");
}

#[tokio::test]
async fn test_channel_delete_is_broadcast_and_closes_the_room() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let channel = assert_ok!(hub.create_channel(alice.id, "random", None).await);
    assert_ok!(hub.send_channel_message(alice.id, channel.id, "first").await);

    let (a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    assert_ok!(
        hub.dispatch(&a, ClientEvent::JoinChannel { channel_id: channel.id })
            .await
    );
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    assert_code!(hub.delete_channel(bob.id, channel.id).await, "authorization_error");

    assert_ok!(hub.delete_channel(alice.id, channel.id).await);
    let expected = vec![ServerEvent::ChannelDeleted { channel_id: channel.id }];
    assert_eq!(drain(&mut alice_rx), expected);
    assert_eq!(drain(&mut bob_rx), expected);
    assert!(hub.rooms().members(RoomId::Channel(channel.id)).is_empty());
    assert!(assert_ok!(hub.list_channels().await).is_empty());
    assert_matches!(
        hub.list_channel_messages(channel.id, &ListMessagesParams::default())
            .await,
        Err(BackendError::NotFoundError { .. })
    );
}
