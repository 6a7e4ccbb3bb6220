//! Direct-message lifecycle and fan-out

use assert_matches::assert_matches;
use chatflow::backend::error::BackendError;
use chatflow::backend::messaging::db;
use chatflow::backend::realtime::ws::handle_frame;
use chatflow::shared::messaging::ListMessagesParams;
use chatflow::shared::{ClientEvent, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::*;

#[tokio::test]
async fn test_hidden_thread_comes_back_on_new_message() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let (_a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let first = assert_ok!(hub.send_direct_message(alice.id, thread_id, "hi").await);
    assert_eq!(first.content, "hi");
    assert_eq!(first.sender.id, alice.id);
    // every participant, sender included
    assert_eq!(drain_names(&mut alice_rx), vec!["dm:new_message"]);
    assert_eq!(drain_names(&mut bob_rx), vec!["dm:new_message"]);

    assert_ok!(hub.delete_thread(bob.id, thread_id).await);
    assert_eq!(drain(&mut bob_rx), vec![ServerEvent::ThreadDeleted { thread_id }]);
    assert_silent(&mut alice_rx);
    assert!(assert_ok!(hub.list_threads(bob.id).await).is_empty());
    assert_eq!(assert_ok!(hub.list_threads(alice.id).await).len(), 1);

    // hiding again keeps it hidden but still confirms to the hider
    assert_ok!(hub.delete_thread(bob.id, thread_id).await);
    assert_eq!(drain(&mut bob_rx), vec![ServerEvent::ThreadDeleted { thread_id }]);
    assert_silent(&mut alice_rx);
    assert!(assert_ok!(hub.list_threads(bob.id).await).is_empty());

    let second = assert_ok!(hub.send_direct_message(alice.id, thread_id, "are you there?").await);
    let delivered = drain(&mut bob_rx);
    assert_eq!(
        delivered,
        vec![ServerEvent::DirectMessage {
            thread_id,
            message: second.clone(),
        }]
    );

    let threads = assert_ok!(hub.list_threads(bob.id).await);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].thread_id, thread_id);
    assert_eq!(threads[0].other_user.profile.id, alice.id);
    assert_eq!(threads[0].last_message.as_deref(), Some("are you there?"));
    assert_eq!(threads[0].unread_count, 2);
}

#[tokio::test]
async fn test_start_thread_is_idempotent_per_pair() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let (left, right) = tokio::join!(
        hub.start_thread(alice.id, bob.id),
        hub.start_thread(bob.id, alice.id)
    );
    let left = assert_ok!(left);
    let right = assert_ok!(right);
    assert_eq!(left, right);
    assert_eq!(assert_ok!(hub.start_thread(alice.id, bob.id).await), left);
    assert_eq!(assert_ok!(db::count_threads_for_pair(db.pool(), alice.id, bob.id).await), 1);
}

#[tokio::test]
async fn test_start_thread_from_two_hubs_shares_one_thread() {
    let db = TestDatabase::new().await;
    let (east, west) = (db.hub(), db.hub());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let (left, right) = tokio::join!(
        east.start_thread(alice.id, bob.id),
        west.start_thread(bob.id, alice.id)
    );
    assert_eq!(assert_ok!(left), assert_ok!(right));
    assert_eq!(assert_ok!(db::count_threads_for_pair(db.pool(), alice.id, bob.id).await), 1);
}

#[tokio::test]
async fn test_create_or_reuse_returns_the_stored_thread() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    // another writer got there first
    let stored = assert_ok!(db::create_thread(db.pool(), alice.id, bob.id).await);

    let reused = assert_ok!(hub.threads().create_or_reuse(bob.id, alice.id).await);
    assert_eq!(reused, stored);
    assert_eq!(assert_ok!(db::count_threads_for_pair(db.pool(), alice.id, bob.id).await), 1);
}

#[tokio::test]
async fn test_content_is_stored_as_sent() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);

    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut bob_rx);

    for content in ["  x\n", "    indented code\n"] {
        let sent = assert_ok!(hub.send_direct_message(alice.id, thread_id, content).await);
        assert_eq!(sent.content, content);
    }
    let delivered: Vec<_> = drain(&mut bob_rx)
        .into_iter()
        .map(|event| match event {
            ServerEvent::DirectMessage { message, .. } => message.content,
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(delivered, vec!["  x\n", "    indented code\n"]);

    let page = assert_ok!(
        hub.list_direct_messages(bob.id, thread_id, &ListMessagesParams::default())
            .await
    );
    let stored: Vec<_> = page.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(stored, vec!["  x\n", "    indented code\n"]);
}

#[tokio::test]
async fn test_start_thread_rejects_self_and_unknown_users() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;

    assert_code!(hub.start_thread(alice.id, alice.id).await, "validation_error");
    assert_code!(hub.start_thread(alice.id, uuid::Uuid::new_v4()).await, "validation_error");
}

#[tokio::test]
async fn test_start_thread_reshows_for_caller_only() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    assert_ok!(hub.delete_thread(alice.id, thread_id).await);
    assert_ok!(hub.delete_thread(bob.id, thread_id).await);

    assert_eq!(assert_ok!(hub.start_thread(alice.id, bob.id).await), thread_id);
    assert_eq!(assert_ok!(db::is_visible(db.pool(), thread_id, alice.id).await), Some(true));
    assert_eq!(assert_ok!(db::is_visible(db.pool(), thread_id, bob.id).await), Some(false));
}

#[tokio::test]
async fn test_typing_skips_every_connection_of_the_typist() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);

    let (a1, mut a1_rx) = assert_ok!(hub.connect(alice.id).await);
    let (a2, mut a2_rx) = assert_ok!(hub.connect(alice.id).await);
    let (b1, mut b1_rx) = assert_ok!(hub.connect(bob.id).await);
    for conn in [&a1, &a2, &b1] {
        assert_ok!(hub.dispatch(conn, ClientEvent::JoinThread { thread_id }).await);
    }
    drain(&mut a1_rx);
    drain(&mut a2_rx);
    drain(&mut b1_rx);

    assert_ok!(hub.dispatch(&a1, ClientEvent::Typing { thread_id }).await);
    assert_ok!(hub.dispatch(&a1, ClientEvent::StopTyping { thread_id }).await);

    assert_eq!(
        drain(&mut b1_rx),
        vec![
            ServerEvent::Typing { thread_id, user_id: alice.id },
            ServerEvent::StopTyping { thread_id, user_id: alice.id },
        ]
    );
    assert_silent(&mut a1_rx);
    assert_silent(&mut a2_rx);
}

#[tokio::test]
async fn test_outsiders_cannot_touch_a_thread() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let mallory = create_test_user(db.pool(), "mallory").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);

    let (conn, _rx) = assert_ok!(hub.connect(mallory.id).await);
    assert_matches!(
        hub.dispatch(&conn, ClientEvent::JoinThread { thread_id }).await,
        Err(BackendError::AuthorizationError { .. })
    );
    assert_matches!(
        hub.dispatch(&conn, ClientEvent::Typing { thread_id }).await,
        Err(BackendError::AuthorizationError { .. })
    );
    assert_matches!(
        hub.send_direct_message(mallory.id, thread_id, "let me in").await,
        Err(BackendError::AuthorizationError { .. })
    );
    assert_matches!(
        hub.list_direct_messages(mallory.id, thread_id, &ListMessagesParams::default()).await,
        Err(BackendError::AuthorizationError { .. })
    );
    assert_matches!(
        hub.send_direct_message(alice.id, uuid::Uuid::new_v4(), "hello?").await,
        Err(BackendError::NotFoundError { .. })
    );
}

#[tokio::test]
async fn test_read_receipts_go_to_the_other_side_and_never_move_back() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    let m1 = assert_ok!(hub.send_direct_message(alice.id, thread_id, "one").await);
    let m2 = assert_ok!(hub.send_direct_message(alice.id, thread_id, "two").await);

    let (_a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    assert!(assert_ok!(hub.mark_read(bob.id, thread_id, m2.id).await));
    let receipts = drain(&mut alice_rx);
    assert_eq!(receipts.len(), 1);
    assert_matches!(
        &receipts[0],
        ServerEvent::ReadReceipt { user_id, last_read_message_id, .. }
            if *user_id == bob.id && *last_read_message_id == m2.id
    );
    assert_silent(&mut bob_rx);

    assert!(!assert_ok!(hub.mark_read(bob.id, thread_id, m1.id).await));
    assert_silent(&mut alice_rx);

    let threads = assert_ok!(hub.list_threads(bob.id).await);
    assert_eq!(threads[0].unread_count, 0);

    assert_matches!(
        hub.mark_read(bob.id, thread_id, uuid::Uuid::new_v4()).await,
        Err(BackendError::NotFoundError { .. })
    );
}

#[tokio::test]
async fn test_soft_delete_is_sender_only_and_announced_once() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    let kept = assert_ok!(hub.send_direct_message(alice.id, thread_id, "keep me").await);
    let message = assert_ok!(hub.send_direct_message(alice.id, thread_id, "oops").await);

    let (_a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    assert_matches!(
        hub.delete_direct_message(bob.id, thread_id, message.id).await,
        Err(BackendError::AuthorizationError { .. })
    );

    assert_ok!(hub.delete_direct_message(alice.id, thread_id, message.id).await);
    let expected = vec![ServerEvent::MessageDeleted {
        thread_id,
        message_id: message.id,
    }];
    assert_eq!(drain(&mut alice_rx), expected);
    assert_eq!(drain(&mut bob_rx), expected);

    assert_ok!(hub.delete_direct_message(alice.id, thread_id, message.id).await);
    assert_silent(&mut alice_rx);
    assert_silent(&mut bob_rx);

    let history = assert_ok!(
        hub.list_direct_messages(bob.id, thread_id, &ListMessagesParams::default())
            .await
    );
    let ids: Vec<_> = history.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![kept.id]);
    assert!(!history.has_more);

    let threads = assert_ok!(hub.list_threads(bob.id).await);
    assert_eq!(threads[0].last_message, None);
    assert_eq!(threads[0].unread_count, 1);
}

#[tokio::test]
async fn test_socket_and_rest_paths_fan_out_alike() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);

    let (a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let frame = serde_json::json!({
        "event": "dm:send_message",
        "data": { "threadId": thread_id, "content": "over the socket" }
    })
    .to_string();
    handle_frame(&hub, &a, &frame).await;
    assert_ok!(hub.send_direct_message(alice.id, thread_id, "over http").await);

    let contents: Vec<_> = drain(&mut bob_rx)
        .into_iter()
        .map(|event| match event {
            ServerEvent::DirectMessage { message, .. } => message.content,
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(contents, vec!["over the socket", "over http"]);
    assert_eq!(drain_names(&mut alice_rx), vec!["dm:new_message", "dm:new_message"]);
}

#[tokio::test]
async fn test_bad_frames_are_reported_to_the_sender_only() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);

    let (a, mut alice_rx) = assert_ok!(hub.connect(alice.id).await);
    let (_b, mut bob_rx) = assert_ok!(hub.connect(bob.id).await);
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    handle_frame(&hub, &a, "{not json").await;
    let blank = serde_json::json!({
        "event": "dm:send_message",
        "data": { "threadId": thread_id, "content": "   " }
    })
    .to_string();
    handle_frame(&hub, &a, &blank).await;

    let codes: Vec<_> = drain(&mut alice_rx)
        .into_iter()
        .map(|event| match event {
            ServerEvent::Error { code, .. } => code,
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(codes, vec!["invalid_payload", "validation_error"]);
    assert_silent(&mut bob_rx);
}

#[tokio::test]
async fn test_history_pages_oldest_first() {
    let db = TestDatabase::new().await;
    let hub = db.hub();
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let thread_id = assert_ok!(hub.start_thread(alice.id, bob.id).await);
    for text in ["a", "b", "c"] {
        assert_ok!(hub.send_direct_message(alice.id, thread_id, text).await);
    }

    let params = ListMessagesParams { limit: Some(2), offset: None };
    let page = assert_ok!(hub.list_direct_messages(bob.id, thread_id, &params).await);
    let contents: Vec<_> = page.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["a", "b"]);
    assert!(page.has_more);

    let params = ListMessagesParams { limit: Some(2), offset: Some(2) };
    let page = assert_ok!(hub.list_direct_messages(bob.id, thread_id, &params).await);
    assert_eq!(page.messages.len(), 1);
    assert!(!page.has_more);
}
