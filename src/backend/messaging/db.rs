//! Database operations for direct messages
//!
//! Free functions over the SQLite pool for DM threads, participants and
//! messages. Operations that touch more than one row run in a single
//! transaction; nothing here takes locks or knows about live connections.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::backend::auth::users::summary_from_row;
use crate::shared::messaging::{DmMessage, UserSummary};

/// Location of a message inside its thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMeta {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub is_deleted: bool,
    /// Insertion order within the database
    pub seq: i64,
}

/// A visible thread row before presence is attached
#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub thread_id: Uuid,
    pub other_user: UserSummary,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// Canonical ordering of a pair, matching the `user_low < user_high` check
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}

/// Find the thread of an unordered pair of users
pub async fn find_thread_by_pair(
    pool: &SqlitePool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    let (low, high) = ordered_pair(user_a, user_b);
    sqlx::query_scalar(
        r#"
        SELECT id FROM dm_threads
        WHERE user_low = ? AND user_high = ?
        "#,
    )
    .bind(low)
    .bind(high)
    .fetch_optional(pool)
    .await
}

/// Create a thread and both participant rows atomically
///
/// Fails with a unique violation if the pair already has a thread.
pub async fn create_thread(
    pool: &SqlitePool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<Uuid, sqlx::Error> {
    let (low, high) = ordered_pair(user_a, user_b);
    let thread_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO dm_threads (id, user_low, user_high, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(thread_id)
    .bind(low)
    .bind(high)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for user_id in [low, high] {
        sqlx::query(
            r#"
            INSERT INTO dm_participants (thread_id, user_id, visible)
            VALUES (?, ?, 1)
            "#,
        )
        .bind(thread_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(thread_id)
}

/// Participants of a thread; empty if the thread does not exist
pub async fn thread_participants(
    pool: &SqlitePool,
    thread_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT user_id FROM dm_participants
        WHERE thread_id = ?
        ORDER BY user_id
        "#,
    )
    .bind(thread_id)
    .fetch_all(pool)
    .await
}

/// Set one participant's visibility; returns whether the row changed
pub async fn set_visibility(
    pool: &SqlitePool,
    thread_id: Uuid,
    user_id: Uuid,
    visible: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE dm_participants
        SET visible = ?
        WHERE thread_id = ? AND user_id = ? AND visible <> ?
        "#,
    )
    .bind(visible)
    .bind(thread_id)
    .bind(user_id)
    .bind(visible)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_visible(
    pool: &SqlitePool,
    thread_id: Uuid,
    user_id: Uuid,
) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT visible FROM dm_participants
        WHERE thread_id = ? AND user_id = ?
        "#,
    )
    .bind(thread_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Store a message, move the thread's last-message pointer and make the
/// thread visible again for every participant, all in one transaction
pub async fn insert_message(
    pool: &SqlitePool,
    thread_id: Uuid,
    sender: &UserSummary,
    content: &str,
) -> Result<DmMessage, sqlx::Error> {
    let message_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO dm_messages (id, thread_id, sender_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(message_id)
    .bind(thread_id)
    .bind(sender.id)
    .bind(content)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE dm_threads
        SET last_message_id = ?, last_message_at = ?
        WHERE id = ?
        "#,
    )
    .bind(message_id)
    .bind(now)
    .bind(thread_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE dm_participants
        SET visible = 1
        WHERE thread_id = ?
        "#,
    )
    .bind(thread_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(DmMessage {
        id: message_id,
        thread_id,
        sender: sender.clone(),
        content: content.to_string(),
        created_at: now,
    })
}

fn meta_from_row(row: &SqliteRow) -> Result<MessageMeta, sqlx::Error> {
    Ok(MessageMeta {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        is_deleted: row.try_get("is_deleted")?,
        seq: row.try_get("seq")?,
    })
}

/// Look up a message of a specific thread
pub async fn find_message(
    pool: &SqlitePool,
    thread_id: Uuid,
    message_id: Uuid,
) -> Result<Option<MessageMeta>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, sender_id, is_deleted, seq
        FROM dm_messages
        WHERE id = ? AND thread_id = ?
        "#,
    )
    .bind(message_id)
    .bind(thread_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(meta_from_row).transpose()
}

/// Flag a message as deleted; returns false if it already was
pub async fn mark_deleted(pool: &SqlitePool, message_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE dm_messages
        SET is_deleted = 1
        WHERE id = ? AND is_deleted = 0
        "#,
    )
    .bind(message_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Position of the participant's current read pointer, if any
pub async fn read_pointer_seq(
    pool: &SqlitePool,
    thread_id: Uuid,
    user_id: Uuid,
) -> Result<Option<i64>, sqlx::Error> {
    let seq: Option<Option<i64>> = sqlx::query_scalar(
        r#"
        SELECT m.seq
        FROM dm_participants p
        LEFT JOIN dm_messages m ON m.id = p.last_read_message_id
        WHERE p.thread_id = ? AND p.user_id = ?
        "#,
    )
    .bind(thread_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(seq.flatten())
}

/// Upsert a participant's read pointer
pub async fn upsert_read_pointer(
    pool: &SqlitePool,
    thread_id: Uuid,
    user_id: Uuid,
    message_id: Uuid,
    read_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO dm_participants (thread_id, user_id, visible, last_read_message_id, read_at)
        VALUES (?, ?, 1, ?, ?)
        ON CONFLICT (thread_id, user_id)
        DO UPDATE SET last_read_message_id = excluded.last_read_message_id,
                      read_at = excluded.read_at
        "#,
    )
    .bind(thread_id)
    .bind(user_id)
    .bind(message_id)
    .bind(read_at)
    .execute(pool)
    .await?;

    Ok(())
}

fn dm_message_from_row(row: &SqliteRow) -> Result<DmMessage, sqlx::Error> {
    Ok(DmMessage {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        sender: summary_from_row(row, "sender_")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Non-deleted messages of a thread, oldest first
pub async fn list_messages(
    pool: &SqlitePool,
    thread_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<DmMessage>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.thread_id, m.content, m.created_at,
               u.id AS sender_id, u.username AS sender_username,
               u.display_name AS sender_display_name, u.avatar_url AS sender_avatar_url,
               u.bio AS sender_bio
        FROM dm_messages m
        JOIN users u ON u.id = m.sender_id
        WHERE m.thread_id = ? AND m.is_deleted = 0
        ORDER BY m.seq ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(thread_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(dm_message_from_row).collect()
}

fn thread_row_from_row(row: &SqliteRow) -> Result<ThreadRow, sqlx::Error> {
    let last_deleted: Option<bool> = row.try_get("last_deleted")?;
    let last_content: Option<String> = row.try_get("last_content")?;

    Ok(ThreadRow {
        thread_id: row.try_get("thread_id")?,
        other_user: summary_from_row(row, "other_")?,
        last_message: match last_deleted {
            Some(false) => last_content,
            _ => None,
        },
        last_message_at: row.try_get("last_message_at")?,
        unread_count: row.try_get("unread_count")?,
    })
}

/// Threads visible to `user_id`, newest activity first, empty threads last
pub async fn list_visible_threads(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<ThreadRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT t.id AS thread_id, t.last_message_at,
               u.id AS other_id, u.username AS other_username,
               u.display_name AS other_display_name, u.avatar_url AS other_avatar_url,
               u.bio AS other_bio,
               lm.content AS last_content, lm.is_deleted AS last_deleted,
               (
                   SELECT COUNT(*) FROM dm_messages um
                   WHERE um.thread_id = t.id
                     AND um.sender_id <> me.user_id
                     AND um.is_deleted = 0
                     AND um.seq > COALESCE(
                         (SELECT rm.seq FROM dm_messages rm WHERE rm.id = me.last_read_message_id),
                         0
                     )
               ) AS unread_count
        FROM dm_participants me
        JOIN dm_threads t ON t.id = me.thread_id
        JOIN dm_participants other ON other.thread_id = t.id AND other.user_id <> me.user_id
        JOIN users u ON u.id = other.user_id
        LEFT JOIN dm_messages lm ON lm.id = t.last_message_id
        WHERE me.user_id = ? AND me.visible = 1
        ORDER BY t.last_message_at IS NULL, t.last_message_at DESC, t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(thread_row_from_row).collect()
}

/// Number of thread rows for a pair (used to check the one-thread-per-pair rule)
pub async fn count_threads_for_pair(
    pool: &SqlitePool,
    user_a: Uuid,
    user_b: Uuid,
) -> Result<i64, sqlx::Error> {
    let (low, high) = ordered_pair(user_a, user_b);
    sqlx::query_scalar("SELECT COUNT(*) FROM dm_threads WHERE user_low = ? AND user_high = ?")
        .bind(low)
        .bind(high)
        .fetch_one(pool)
        .await
}
