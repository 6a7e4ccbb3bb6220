//! `/api/chat` endpoints

use axum::http::StatusCode;
use chatflow::shared::messaging::{
    Channel, ChannelMessage, ListChannelMessagesResponse, ListChannelsResponse, UserWithStatus,
};
use chatflow::shared::{PresenceStatus, ServerEvent};
use serde_json::json;

use super::TestApp;
use crate::common::*;

#[tokio::test]
async fn test_channel_lifecycle() {
    let app = TestApp::new().await;
    let alice = create_test_user(app.db.pool(), "alice").await;
    let bob = create_test_user(app.db.pool(), "bob").await;

    let response = app
        .server
        .post("/api/chat/channels")
        .authorization_bearer(&alice.token)
        .json(&json!({ "name": "general", "description": "talk" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let channel = response.json::<Channel>();
    assert_eq!(channel.name, "general");

    let channels = app
        .server
        .get("/api/chat/channels")
        .authorization_bearer(&bob.token)
        .await
        .json::<ListChannelsResponse>()
        .channels;
    assert_eq!(channels, vec![channel.clone()]);

    let (_conn, _rx) = assert_ok!(app.hub.connect(alice.id).await);
    let response = app
        .server
        .post(&format!("/api/chat/channels/{}/messages", channel.id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "content": "welcome" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.json::<ChannelMessage>().user.id, alice.id);

    let messages = app
        .server
        .get(&format!("/api/chat/channels/{}/messages", channel.id))
        .authorization_bearer(&bob.token)
        .await
        .json::<ListChannelMessagesResponse>()
        .messages;
    assert_eq!(messages.len(), 1);

    let members = app
        .server
        .get(&format!("/api/chat/channels/{}/members", channel.id))
        .authorization_bearer(&bob.token)
        .await
        .json::<Vec<UserWithStatus>>();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].status, PresenceStatus::Online);

    let response = app
        .server
        .delete(&format!("/api/chat/channels/{}", channel.id))
        .authorization_bearer(&bob.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let (_bob_conn, mut bob_rx) = assert_ok!(app.hub.connect(bob.id).await);
    drain(&mut bob_rx);
    let response = app
        .server
        .delete(&format!("/api/chat/channels/{}", channel.id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        drain(&mut bob_rx),
        vec![ServerEvent::ChannelDeleted { channel_id: channel.id }]
    );

    let response = app
        .server
        .get(&format!("/api/chat/channels/{}/messages", channel.id))
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
