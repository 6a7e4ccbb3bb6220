//! Authentication test helpers

use chatflow::backend::auth::{create_user, JwtAuth};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::database::TEST_SECRET;

/// Test user with a valid token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

pub fn test_auth() -> JwtAuth {
    JwtAuth::new(TEST_SECRET, 1)
}

/// Create a test user in the database
pub async fn create_test_user(pool: &SqlitePool, username: &str) -> TestUser {
    let user = create_user(pool, username, None)
        .await
        .expect("Failed to create test user");
    let token = test_auth()
        .create_token(user.id, &user.username)
        .expect("Failed to create test token");

    TestUser {
        id: user.id,
        username: user.username,
        token,
    }
}

/// Create a test user with a unique username
pub async fn create_unique_test_user(pool: &SqlitePool) -> TestUser {
    let username = format!("user_{}", Uuid::new_v4().simple());
    create_test_user(pool, &username).await
}
