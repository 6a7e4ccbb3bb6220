/**
 * Database Operations for Channels
 *
 * This module provides database operations for group channels and the
 * messages posted to them.
 */

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::backend::auth::users::summary_from_row;
use crate::shared::messaging::{Channel, ChannelMessage, UserSummary};

fn channel_from_row(row: &SqliteRow) -> Result<Channel, sqlx::Error> {
    Ok(Channel {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn channel_message_from_row(row: &SqliteRow) -> Result<ChannelMessage, sqlx::Error> {
    Ok(ChannelMessage {
        id: row.try_get("id")?,
        channel_id: row.try_get("channel_id")?,
        user: summary_from_row(row, "user_")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Create a channel
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `name` - Channel name (already validated)
/// * `description` - Optional description
/// * `created_by` - Creator, who alone may delete the channel
pub async fn create_channel(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
    created_by: Uuid,
) -> Result<Channel, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO channels (id, name, description, created_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Channel {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        created_at: now,
    })
}

/// All channels, oldest first
pub async fn list_channels(pool: &SqlitePool) -> Result<Vec<Channel>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, description, created_at
        FROM channels
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(channel_from_row).collect()
}

/// Owner of a channel; `None` if the channel does not exist
///
/// The inner option is `None` for channels whose creator is unknown.
pub async fn channel_owner(
    pool: &SqlitePool,
    channel_id: Uuid,
) -> Result<Option<Option<Uuid>>, sqlx::Error> {
    sqlx::query_scalar("SELECT created_by FROM channels WHERE id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await
}

pub async fn channel_exists(pool: &SqlitePool, channel_id: Uuid) -> Result<bool, sqlx::Error> {
    Ok(channel_owner(pool, channel_id).await?.is_some())
}

/// Store a channel message
pub async fn insert_channel_message(
    pool: &SqlitePool,
    channel_id: Uuid,
    author: &UserSummary,
    content: &str,
) -> Result<ChannelMessage, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO channel_messages (id, channel_id, user_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(channel_id)
    .bind(author.id)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(ChannelMessage {
        id,
        channel_id,
        user: author.clone(),
        content: content.to_string(),
        created_at: now,
    })
}

/// Messages of a channel, oldest first
pub async fn list_channel_messages(
    pool: &SqlitePool,
    channel_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ChannelMessage>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.channel_id, m.content, m.created_at,
               u.id AS user_id, u.username AS user_username,
               u.display_name AS user_display_name, u.avatar_url AS user_avatar_url,
               u.bio AS user_bio
        FROM channel_messages m
        JOIN users u ON u.id = m.user_id
        WHERE m.channel_id = ?
        ORDER BY m.seq ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(channel_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(channel_message_from_row).collect()
}

/// Users who have posted in a channel, by display name
pub async fn channel_members(
    pool: &SqlitePool,
    channel_id: Uuid,
) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT u.id AS user_id, u.username AS user_username,
               u.display_name AS user_display_name, u.avatar_url AS user_avatar_url,
               u.bio AS user_bio
        FROM channel_messages m
        JOIN users u ON u.id = m.user_id
        WHERE m.channel_id = ?
        GROUP BY u.id
        ORDER BY LOWER(COALESCE(u.display_name, u.username)) ASC
        "#,
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(|row| summary_from_row(row, "user_")).collect()
}

/// Delete a channel and its messages in one transaction
///
/// Returns false if the channel did not exist.
pub async fn delete_channel(pool: &SqlitePool, channel_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM channel_messages WHERE channel_id = ?")
        .bind(channel_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM channels WHERE id = ?")
        .bind(channel_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}
