/**
 * Message Service
 *
 * Creates, lists, pages and edits messages. Every read and write is
 * authorized against the conversation loaded from the store; identity
 * fields supplied by clients are never trusted.
 *
 * # Ordering
 *
 * Messages of a conversation are totally ordered by `(created_at, sequence)`.
 * Full history and every page are returned oldest first.
 *
 * # Pagination
 *
 * Pages are counted from the newest end: page 0 holds the most recent
 * `page_size` messages, page 1 the ones before them. A page past the end is
 * empty.
 *
 * The service never notifies anyone; callers fan out after a successful
 * write (see `realtime::delivery`).
 */

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{ChatStore, NewMessage};
use crate::shared::messaging::{validate_content, Conversation, MediaRef, Message, MessagePage};

#[derive(Clone)]
pub struct MessageService {
    chats: Arc<dyn ChatStore>,
    page_size: u32,
    history_cap: u32,
}

impl MessageService {
    pub fn new(chats: Arc<dyn ChatStore>, page_size: u32, history_cap: u32) -> Self {
        Self {
            chats,
            page_size: page_size.max(1),
            history_cap: history_cap.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Persist a new message from a member of the conversation
    ///
    /// `NotFound` when the conversation is missing or the sender is not a
    /// member; `InvalidArgument` for an empty body without media.
    pub async fn create_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        body: &str,
        media: Option<MediaRef>,
    ) -> BackendResult<Message> {
        let conversation = self.chats.conversation(chat_id).await?;
        match conversation {
            Some(c) if c.has_member(sender_id) => {}
            _ => return Err(BackendError::not_found("Chat not found")),
        }

        validate_content(body, media.as_ref())?;

        let message = self
            .chats
            .insert_message(NewMessage {
                chat_id,
                sender_id,
                body: body.to_string(),
                media,
            })
            .await?;

        tracing::debug!("[Messaging] Message {} stored in chat {} (seq {})", message.id, chat_id, message.sequence);
        Ok(message)
    }

    /// Full history, bounded to the most recent `history_cap` messages
    pub async fn list_messages(&self, chat_id: Uuid, requester: Uuid) -> BackendResult<Vec<Message>> {
        self.authorize_member(chat_id, requester).await?;
        self.chats
            .messages_from_newest(chat_id, 0, u64::from(self.history_cap))
            .await
    }

    /// One page of history
    pub async fn list_messages_paged(&self, chat_id: Uuid, requester: Uuid, page: u32) -> BackendResult<MessagePage> {
        self.authorize_member(chat_id, requester).await?;

        let size = u64::from(self.page_size);
        let skip = u64::from(page) * size;
        let total = self.chats.count_messages(chat_id).await?;

        let messages = if skip >= total {
            Vec::new()
        } else {
            self.chats.messages_from_newest(chat_id, skip, size).await?
        };

        Ok(MessagePage {
            page,
            page_size: self.page_size,
            has_more: skip + size < total,
            messages,
        })
    }

    /// Replace the body of a message; only its sender may do this
    ///
    /// Media cannot be changed. An empty body is accepted only when the
    /// message carries media.
    pub async fn edit_message(&self, message_id: Uuid, requester: Uuid, new_body: &str) -> BackendResult<Message> {
        let existing = self
            .chats
            .message(message_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))?;

        if existing.sender_id != requester {
            tracing::warn!("[Messaging] {} tried to edit message {} owned by {}", requester, message_id, existing.sender_id);
            return Err(BackendError::forbidden("Only the sender can edit this message"));
        }

        validate_content(new_body, existing.media.as_ref())?;

        let edited = self
            .chats
            .update_message_body(message_id, new_body, Utc::now())
            .await?;

        tracing::debug!("[Messaging] Message {} edited", message_id);
        Ok(edited)
    }

    /// Members of the message's conversation other than its sender
    pub async fn recipients(&self, message: &Message) -> BackendResult<Vec<Uuid>> {
        let conversation = self
            .chats
            .conversation(message.chat_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Chat not found"))?;
        Ok(conversation.other_members(message.sender_id))
    }

    async fn authorize_member(&self, chat_id: Uuid, requester: Uuid) -> BackendResult<Conversation> {
        let conversation = self
            .chats
            .conversation(chat_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Chat not found"))?;

        if !conversation.has_member(requester) {
            return Err(BackendError::forbidden("Not a member of this chat"));
        }
        Ok(conversation)
    }
}
