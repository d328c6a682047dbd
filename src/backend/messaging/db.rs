//! Database operations for messaging
//!
//! PostgreSQL queries for conversations and messages. Messages are ordered
//! by `(created_at, seq)`; `seq` comes from a `BIGSERIAL` column so it is
//! strictly increasing across the whole table.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::messaging::{pair_key, Conversation, MediaKind, MediaRef, Message};

const MESSAGE_COLUMNS: &str = "id, seq, chat_id, sender_id, body, media_url, media_kind, created_at, edited_at";

fn conversation_from_row(row: &PgRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        admin_id: row.get("admin_id"),
        receiver_id: row.get("receiver_id"),
        created_at: row.get("created_at"),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    let media_url: Option<String> = row.get("media_url");
    let media_kind: Option<String> = row.get("media_kind");
    let edited_at: Option<DateTime<Utc>> = row.get("edited_at");

    Message {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        sender_id: row.get("sender_id"),
        message: row.get("body"),
        media: media_url.map(|url| MediaRef {
            url,
            kind: media_kind.as_deref().map(MediaKind::parse).unwrap_or(MediaKind::Other),
        }),
        created_at: row.get("created_at"),
        sequence: row.get("seq"),
        edited: edited_at.is_some(),
        edited_at,
    }
}

/// Insert a conversation for a member pair, or return the existing one
///
/// Relies on the unique `(member_low, member_high)` constraint, so two
/// concurrent calls for the same pair still end with one row.
pub async fn get_or_create_conversation(
    pool: &PgPool,
    admin_id: Uuid,
    receiver_id: Uuid,
) -> Result<(Conversation, bool), sqlx::Error> {
    let (low, high) = pair_key(admin_id, receiver_id);

    let inserted = sqlx::query(
        r#"
        INSERT INTO conversations (id, admin_id, receiver_id, member_low, member_high, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (member_low, member_high) DO NOTHING
        RETURNING id, admin_id, receiver_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(admin_id)
    .bind(receiver_id)
    .bind(low)
    .bind(high)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    if let Some(row) = inserted {
        return Ok((conversation_from_row(&row), true));
    }

    let row = sqlx::query(
        r#"
        SELECT id, admin_id, receiver_id, created_at
        FROM conversations
        WHERE member_low = $1 AND member_high = $2
        "#,
    )
    .bind(low)
    .bind(high)
    .fetch_one(pool)
    .await?;

    Ok((conversation_from_row(&row), false))
}

/// Get a conversation by ID
pub async fn get_conversation(pool: &PgPool, id: Uuid) -> Result<Option<Conversation>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, admin_id, receiver_id, created_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(conversation_from_row))
}

/// Get conversations for a user
pub async fn get_conversations_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Conversation>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, admin_id, receiver_id, created_at
        FROM conversations
        WHERE admin_id = $1 OR receiver_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(conversation_from_row).collect())
}

/// Store a message in the database
///
/// The database clock stamps `created_at`, clamped so it never goes behind
/// the newest message already in the chat. Fails with a foreign-key
/// violation when the conversation does not exist.
pub async fn insert_message(
    pool: &PgPool,
    chat_id: Uuid,
    sender_id: Uuid,
    body: &str,
    media: Option<&MediaRef>,
) -> Result<Message, sqlx::Error> {
    let query = format!(
        r#"
        INSERT INTO messages (id, chat_id, sender_id, body, media_url, media_kind, created_at)
        VALUES (
            $1, $2, $3, $4, $5, $6,
            GREATEST(clock_timestamp(), (SELECT MAX(created_at) FROM messages WHERE chat_id = $2))
        )
        RETURNING {}
        "#,
        MESSAGE_COLUMNS
    );

    let row = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(sender_id)
        .bind(body)
        .bind(media.map(|m| m.url.as_str()))
        .bind(media.map(|m| m.kind.as_str()))
        .fetch_one(pool)
        .await?;

    Ok(message_from_row(&row))
}

/// Get a message by ID
pub async fn get_message(pool: &PgPool, id: Uuid) -> Result<Option<Message>, sqlx::Error> {
    let query = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(message_from_row))
}

/// Count the messages of a conversation
pub async fn count_messages(pool: &PgPool, chat_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM messages WHERE chat_id = $1")
        .bind(chat_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("total"))
}

/// Get a window of messages counted from the newest end, oldest first
pub async fn get_messages_from_newest(
    pool: &PgPool,
    chat_id: Uuid,
    offset: i64,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {}
        FROM messages
        WHERE chat_id = $1
        ORDER BY created_at DESC, seq DESC
        LIMIT $2 OFFSET $3
        "#,
        MESSAGE_COLUMNS
    );

    let rows = sqlx::query(&query)
        .bind(chat_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let mut messages: Vec<Message> = rows.iter().map(message_from_row).collect();
    messages.reverse();
    Ok(messages)
}

/// Replace a message body and stamp the edit time
pub async fn update_message_body(
    pool: &PgPool,
    id: Uuid,
    body: &str,
    edited_at: DateTime<Utc>,
) -> Result<Option<Message>, sqlx::Error> {
    let query = format!(
        "UPDATE messages SET body = $1, edited_at = $2 WHERE id = $3 RETURNING {}",
        MESSAGE_COLUMNS
    );

    let row = sqlx::query(&query)
        .bind(body)
        .bind(edited_at)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(message_from_row))
}
