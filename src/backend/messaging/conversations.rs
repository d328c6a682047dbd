//! Conversation service
//!
//! Creates and lists one-to-one conversations. A conversation is unique per
//! unordered member pair: asking for a chat with someone you already talk to
//! returns the existing one.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{ChatStore, UserStore};
use crate::shared::messaging::{ChatCard, Conversation};

#[derive(Clone)]
pub struct ConversationService {
    chats: Arc<dyn ChatStore>,
    users: Arc<dyn UserStore>,
}

impl ConversationService {
    pub fn new(chats: Arc<dyn ChatStore>, users: Arc<dyn UserStore>) -> Self {
        Self { chats, users }
    }

    /// Create a chat between `caller` and `receiver`, or return the existing one
    ///
    /// The boolean is `true` when this call created the conversation.
    pub async fn create_individual_chat(&self, caller: Uuid, receiver: Uuid) -> BackendResult<(Conversation, bool)> {
        if caller == receiver {
            return Err(BackendError::invalid_argument("Cannot start a chat with yourself"));
        }
        if self.users.user_by_id(receiver).await?.is_none() {
            return Err(BackendError::not_found("Receiver not found"));
        }

        let (conversation, created) = self.chats.get_or_insert_conversation(caller, receiver).await?;
        if created {
            tracing::info!("[Messaging] Chat {} created between {} and {}", conversation.id, caller, receiver);
        } else {
            tracing::debug!("[Messaging] Chat {} already exists for {} and {}", conversation.id, caller, receiver);
        }
        Ok((conversation, created))
    }

    /// The caller's chats, most recently active first
    pub async fn list_chats(&self, caller: Uuid) -> BackendResult<Vec<ChatCard>> {
        let conversations = self.chats.conversations_for(caller).await?;

        let mut cards = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            cards.push(self.chat_card(conversation).await?);
        }
        cards.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        Ok(cards)
    }

    /// Decorate a conversation with member details and its last message
    pub async fn chat_card(&self, conversation: Conversation) -> BackendResult<ChatCard> {
        let admin = self
            .users
            .user_by_id(conversation.admin_id)
            .await?
            .ok_or_else(|| BackendError::internal(format!("Chat {} has a missing admin", conversation.id)))?;
        let receiver = self
            .users
            .user_by_id(conversation.receiver_id)
            .await?
            .ok_or_else(|| BackendError::internal(format!("Chat {} has a missing receiver", conversation.id)))?;
        let last_message = self.chats.last_message(conversation.id).await?;

        Ok(ChatCard {
            conversation,
            admin_user_details: admin.to_summary(),
            receiver_user_details: receiver.to_summary(),
            last_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::{MemoryStore, NewMessage, NewUser};
    use assert_matches::assert_matches;

    async fn setup() -> (ConversationService, Arc<MemoryStore>, Uuid, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (name, email) in [("Ada", "ada@example.com"), ("Bo", "bo@example.com"), ("Cy", "cy@example.com")] {
            let user = store
                .insert_user(NewUser {
                    full_name: name.to_string(),
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                    bio: None,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let service = ConversationService::new(store.clone(), store.clone());
        (service, store, ids[0], ids[1], ids[2])
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_pair() {
        let (service, _, a, b, _) = setup().await;

        let (first, created) = service.create_individual_chat(a, b).await.unwrap();
        assert!(created);
        let (second, created) = service.create_individual_chat(a, b).await.unwrap();
        assert!(!created);
        let (reverse, created) = service.create_individual_chat(b, a).await.unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, reverse.id);
        assert_eq!(service.list_chats(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_self_and_unknown() {
        let (service, _, a, _, _) = setup().await;
        assert_matches!(
            service.create_individual_chat(a, a).await,
            Err(BackendError::InvalidArgument { .. })
        );
        assert_matches!(
            service.create_individual_chat(a, Uuid::new_v4()).await,
            Err(BackendError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_list_orders_by_last_activity() {
        let (service, store, a, b, c) = setup().await;
        let (with_b, _) = service.create_individual_chat(a, b).await.unwrap();
        let (with_c, _) = service.create_individual_chat(a, c).await.unwrap();

        store
            .insert_message(NewMessage {
                chat_id: with_b.id,
                sender_id: b,
                body: "latest".to_string(),
                media: None,
            })
            .await
            .unwrap();

        let cards = service.list_chats(a).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].conversation.id, with_b.id);
        assert_eq!(cards[0].last_message.as_ref().map(|m| m.message.as_str()), Some("latest"));
        assert_eq!(cards[1].conversation.id, with_c.id);
        assert_eq!(cards[1].receiver_user_details.full_name, "Cy");

        assert!(service.list_chats(b).await.unwrap().iter().all(|card| card.conversation.has_member(b)));
    }
}
