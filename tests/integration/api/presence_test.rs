//! `/api/users/online` and the public routes

use axum::http::StatusCode;
use chatflow::shared::{PresenceEntry, PresenceStatus, RequestedStatus};
use serde_json::Value;

use super::TestApp;
use crate::common::*;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;
    let response = app.server.get("/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_online_users_follow_connections() {
    let app = TestApp::new().await;
    let alice = create_test_user(app.db.pool(), "alice").await;
    let bob = create_test_user(app.db.pool(), "bob").await;

    let online = app
        .server
        .get("/api/users/online")
        .authorization_bearer(&alice.token)
        .await
        .json::<Vec<PresenceEntry>>();
    assert!(online.is_empty());

    let (conn, _rx) = assert_ok!(app.hub.connect(bob.id).await);
    app.hub.set_status(bob.id, RequestedStatus::Away).await;

    let online = app
        .server
        .get("/api/users/online")
        .authorization_bearer(&alice.token)
        .await
        .json::<Vec<PresenceEntry>>();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].user_id, bob.id);
    assert_eq!(online[0].status, PresenceStatus::Away);

    app.hub.disconnect(conn.id()).await;
    let online = app
        .server
        .get("/api/users/online")
        .authorization_bearer(&alice.token)
        .await
        .json::<Vec<PresenceEntry>>();
    assert!(online.is_empty());
}
