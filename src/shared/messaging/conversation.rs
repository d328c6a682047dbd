//! Conversation Data Structure
//!
//! Represents a one-to-one conversation between an admin (the creator) and a
//! receiver, and the card projection used by chat lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use super::user::UserSummary;

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// User who created the conversation
    pub admin_id: Uuid,
    /// The other participant
    pub receiver_id: Uuid,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// All members of the conversation
    pub fn members(&self) -> Vec<Uuid> {
        vec![self.admin_id, self.receiver_id]
    }

    /// Check if user is a member
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.admin_id == user_id || self.receiver_id == user_id
    }

    /// Members other than `user_id`
    pub fn other_members(&self, user_id: Uuid) -> Vec<Uuid> {
        self.members().into_iter().filter(|&id| id != user_id).collect()
    }

    /// Order-independent key of the member pair
    pub fn pair_key(&self) -> (Uuid, Uuid) {
        pair_key(self.admin_id, self.receiver_id)
    }
}

/// Order-independent key for a one-to-one member pair
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A conversation as shown in the chat list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatCard {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub admin_user_details: UserSummary,
    pub receiver_user_details: UserSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

impl ChatCard {
    /// Time of the last activity, used to sort chat lists
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.conversation.created_at)
    }
}

/// Request to create (or fetch) a one-to-one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub receiver_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let conversation = Conversation {
            id: Uuid::new_v4(),
            admin_id: a,
            receiver_id: b,
            created_at: Utc::now(),
        };

        assert!(conversation.has_member(a));
        assert!(conversation.has_member(b));
        assert!(!conversation.has_member(c));
        assert_eq!(conversation.other_members(a), vec![b]);
        assert_eq!(conversation.other_members(c), vec![a, b]);
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(pair_key(a, b), pair_key(b, a));
    }

    #[test]
    fn test_chat_card_flattens_conversation() {
        let admin = UserSummary {
            id: Uuid::new_v4(),
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            bio: None,
        };
        let receiver = UserSummary {
            id: Uuid::new_v4(),
            full_name: "Bo".to_string(),
            email: "bo@example.com".to_string(),
            bio: None,
        };
        let card = ChatCard {
            conversation: Conversation {
                id: Uuid::new_v4(),
                admin_id: admin.id,
                receiver_id: receiver.id,
                created_at: Utc::now(),
            },
            admin_user_details: admin,
            receiver_user_details: receiver,
            last_message: None,
        };

        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("adminUserDetails").is_some());
        assert!(json.get("receiverUserDetails").is_some());
        assert_eq!(card.last_activity(), card.conversation.created_at);
    }
}
