/**
 * PostgreSQL Store
 *
 * Implements the store traits on top of the query functions in
 * `auth::users` and `messaging::db`. Unique violations surface as
 * `Conflict` through the `sqlx::Error` conversion.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::users::{self, User};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::db;
use crate::backend::store::{ChatStore, NewMessage, NewUser, UserStore};
use crate::shared::messaging::{Conversation, Message};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> BackendResult<User> {
        Ok(users::create_user(&self.pool, user).await?)
    }

    async fn user_by_id(&self, id: Uuid) -> BackendResult<Option<User>> {
        Ok(users::get_user_by_id(&self.pool, id).await?)
    }

    async fn user_by_email(&self, email: &str) -> BackendResult<Option<User>> {
        Ok(users::get_user_by_email(&self.pool, email).await?)
    }

    async fn search_users(&self, keyword: &str, exclude: Uuid, limit: u32) -> BackendResult<Vec<User>> {
        Ok(users::search_users(&self.pool, keyword, exclude, limit).await?)
    }

    async fn update_account(&self, id: Uuid, full_name: &str, bio: Option<&str>) -> BackendResult<User> {
        users::update_account(&self.pool, id, full_name, bio)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> BackendResult<User> {
        users::set_password(&self.pool, id, password_hash)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }

    async fn bump_session_version(&self, id: Uuid) -> BackendResult<i64> {
        users::bump_session_version(&self.pool, id)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn get_or_insert_conversation(
        &self,
        admin_id: Uuid,
        receiver_id: Uuid,
    ) -> BackendResult<(Conversation, bool)> {
        Ok(db::get_or_create_conversation(&self.pool, admin_id, receiver_id).await?)
    }

    async fn conversation(&self, id: Uuid) -> BackendResult<Option<Conversation>> {
        Ok(db::get_conversation(&self.pool, id).await?)
    }

    async fn conversations_for(&self, user_id: Uuid) -> BackendResult<Vec<Conversation>> {
        Ok(db::get_conversations_for_user(&self.pool, user_id).await?)
    }

    async fn insert_message(&self, message: NewMessage) -> BackendResult<Message> {
        db::insert_message(
            &self.pool,
            message.chat_id,
            message.sender_id,
            &message.body,
            message.media.as_ref(),
        )
        .await
        .map_err(|e| {
            let missing_chat = matches!(&e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation());
            if missing_chat {
                BackendError::not_found("Chat not found")
            } else {
                e.into()
            }
        })
    }

    async fn message(&self, id: Uuid) -> BackendResult<Option<Message>> {
        Ok(db::get_message(&self.pool, id).await?)
    }

    async fn count_messages(&self, chat_id: Uuid) -> BackendResult<u64> {
        let total = db::count_messages(&self.pool, chat_id).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn messages_from_newest(&self, chat_id: Uuid, skip: u64, limit: u64) -> BackendResult<Vec<Message>> {
        Ok(db::get_messages_from_newest(&self.pool, chat_id, to_i64(skip), to_i64(limit)).await?)
    }

    async fn last_message(&self, chat_id: Uuid) -> BackendResult<Option<Message>> {
        let mut newest = db::get_messages_from_newest(&self.pool, chat_id, 0, 1).await?;
        Ok(newest.pop())
    }

    async fn update_message_body(
        &self,
        id: Uuid,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> BackendResult<Message> {
        db::update_message_body(&self.pool, id, body, edited_at)
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))
    }
}
