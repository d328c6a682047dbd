/**
 * In-Memory Store
 *
 * Keeps users, conversations and messages in process memory behind one
 * `tokio::sync::RwLock`. Used when no database is configured and by the
 * test suite. Data is lost on restart.
 *
 * Each conversation's messages are kept in a vector in (created_at,
 * sequence) order. Creation times are clamped so they never go backwards
 * within a conversation, which keeps insertion order and sort order equal.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{ChatStore, NewMessage, NewUser, UserStore};
use crate::shared::messaging::{pair_key, Conversation, Message};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
    conversations: HashMap<Uuid, Conversation>,
    conversations_by_pair: HashMap<(Uuid, Uuid), Uuid>,
    messages: HashMap<Uuid, Message>,
    /// Message ids per conversation, oldest first
    timelines: HashMap<Uuid, Vec<Uuid>>,
    next_sequence: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> BackendResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users_by_email.contains_key(&user.email) {
            return Err(BackendError::conflict("Email already registered"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            bio: user.bio,
            session_version: 0,
            created_at: now,
            updated_at: now,
        };
        inner.users_by_email.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> BackendResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> BackendResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users_by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn search_users(&self, keyword: &str, exclude: Uuid, limit: u32) -> BackendResult<Vec<User>> {
        let inner = self.inner.read().await;
        let mut found: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.id != exclude && u.matches(keyword))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn update_account(&self, id: Uuid, full_name: &str, bio: Option<&str>) -> BackendResult<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("User not found"))?;
        user.full_name = full_name.to_string();
        user.bio = bio.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> BackendResult<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("User not found"))?;
        user.password_hash = password_hash.to_string();
        user.session_version += 1;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn bump_session_version(&self, id: Uuid) -> BackendResult<i64> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("User not found"))?;
        user.session_version += 1;
        user.updated_at = Utc::now();
        Ok(user.session_version)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn get_or_insert_conversation(
        &self,
        admin_id: Uuid,
        receiver_id: Uuid,
    ) -> BackendResult<(Conversation, bool)> {
        let mut inner = self.inner.write().await;
        let key = pair_key(admin_id, receiver_id);

        if let Some(existing) = inner
            .conversations_by_pair
            .get(&key)
            .and_then(|id| inner.conversations.get(id))
        {
            return Ok((existing.clone(), false));
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            admin_id,
            receiver_id,
            created_at: Utc::now(),
        };
        inner.conversations_by_pair.insert(key, conversation.id);
        inner.conversations.insert(conversation.id, conversation.clone());
        Ok((conversation, true))
    }

    async fn conversation(&self, id: Uuid) -> BackendResult<Option<Conversation>> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn conversations_for(&self, user_id: Uuid) -> BackendResult<Vec<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .values()
            .filter(|c| c.has_member(user_id))
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: NewMessage) -> BackendResult<Message> {
        let mut inner = self.inner.write().await;
        if !inner.conversations.contains_key(&message.chat_id) {
            return Err(BackendError::not_found("Chat not found"));
        }

        let latest = inner
            .timelines
            .get(&message.chat_id)
            .and_then(|ids| ids.last())
            .and_then(|id| inner.messages.get(id))
            .map(|m| m.created_at);
        let now = Utc::now();
        let created_at = match latest {
            Some(latest) if latest > now => latest,
            _ => now,
        };

        inner.next_sequence += 1;
        let stored = Message {
            id: Uuid::new_v4(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            message: message.body,
            media: message.media,
            created_at,
            sequence: inner.next_sequence,
            edited: false,
            edited_at: None,
        };

        inner.timelines.entry(stored.chat_id).or_default().push(stored.id);
        inner.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn message(&self, id: Uuid) -> BackendResult<Option<Message>> {
        Ok(self.inner.read().await.messages.get(&id).cloned())
    }

    async fn count_messages(&self, chat_id: Uuid) -> BackendResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.timelines.get(&chat_id).map_or(0, |ids| ids.len() as u64))
    }

    async fn messages_from_newest(&self, chat_id: Uuid, skip: u64, limit: u64) -> BackendResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let Some(ids) = inner.timelines.get(&chat_id) else {
            return Ok(Vec::new());
        };

        let total = ids.len() as u64;
        let end = total.saturating_sub(skip);
        let start = end.saturating_sub(limit);

        Ok(ids[start as usize..end as usize]
            .iter()
            .filter_map(|id| inner.messages.get(id))
            .cloned()
            .collect())
    }

    async fn last_message(&self, chat_id: Uuid) -> BackendResult<Option<Message>> {
        let inner = self.inner.read().await;
        Ok(inner
            .timelines
            .get(&chat_id)
            .and_then(|ids| ids.last())
            .and_then(|id| inner.messages.get(id))
            .cloned())
    }

    async fn update_message_body(
        &self,
        id: Uuid,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> BackendResult<Message> {
        let mut inner = self.inner.write().await;
        let message = inner
            .messages
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("Message not found"))?;
        message.message = body.to_string();
        message.edited = true;
        message.edited_at = Some(edited_at);
        Ok(message.clone())
    }
}
