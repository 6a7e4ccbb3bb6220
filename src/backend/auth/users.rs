/**
 * User Records
 *
 * Persistence of the minimal user profile the chat service needs. Account
 * registration and password handling live outside this service; these
 * functions exist for profile lookups and for seeding users in tests and
 * tooling.
 */

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::shared::messaging::UserSummary;

/// User record as stored in the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique)
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// Read a profile from a row whose columns are prefixed with `prefix`
///
/// Join queries alias the user columns (`sender_username`, ...) so the same
/// decoder serves every query that embeds a profile.
pub(crate) fn summary_from_row(row: &SqliteRow, prefix: &str) -> Result<UserSummary, sqlx::Error> {
    Ok(UserSummary {
        id: row.try_get(format!("{prefix}id").as_str())?,
        username: row.try_get(format!("{prefix}username").as_str())?,
        display_name: row.try_get(format!("{prefix}display_name").as_str())?,
        avatar_url: row.try_get(format!("{prefix}avatar_url").as_str())?,
        bio: row.try_get(format!("{prefix}bio").as_str())?,
    })
}

/// Create a new user
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `username` - Unique username
/// * `display_name` - Optional display name
///
/// # Returns
/// Created user or error (unique violation if the username is taken)
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    display_name: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, username, display_name, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(display_name)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(User {
        id,
        username: username.to_string(),
        display_name: display_name.map(str::to_string),
        avatar_url: None,
        bio: None,
        created_at: now,
    })
}

/// Get user by ID
///
/// # Returns
/// User or None if not found
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, display_name, avatar_url, bio, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Check that a user exists
pub async fn user_exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
