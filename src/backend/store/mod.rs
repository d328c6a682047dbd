//! Storage Module
//!
//! Persistence is reached through two traits so services never depend on a
//! concrete database:
//!
//! - [`UserStore`] - user registry
//! - [`ChatStore`] - conversations and messages
//!
//! Two implementations exist:
//!
//! - **`memory`** - in-process maps, used when `DATABASE_URL` is not set and
//!   by the test suite
//! - **`postgres`** - sqlx over the tables in `migrations/`
//!
//! Stores are CRUD only. Authorization and validation live in the services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::error::BackendResult;
use crate::shared::messaging::{Conversation, MediaRef, Message};

/// In-process store
pub mod memory;

/// PostgreSQL store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Fields of a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    /// Already case-folded
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
}

/// Fields of a message about to be inserted
///
/// The store assigns id, creation time and sequence.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub media: Option<MediaRef>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; `Conflict` when the email is taken
    async fn insert_user(&self, user: NewUser) -> BackendResult<User>;

    async fn user_by_id(&self, id: Uuid) -> BackendResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> BackendResult<Option<User>>;

    /// Case-insensitive substring match on full name or email
    async fn search_users(&self, keyword: &str, exclude: Uuid, limit: u32) -> BackendResult<Vec<User>>;

    /// Replace name and bio; `NotFound` for an unknown id
    async fn update_account(&self, id: Uuid, full_name: &str, bio: Option<&str>) -> BackendResult<User>;

    /// Store a new password hash and bump the session version together
    async fn set_password(&self, id: Uuid, password_hash: &str) -> BackendResult<User>;

    /// Bump the session version, returning the new value
    async fn bump_session_version(&self, id: Uuid) -> BackendResult<i64>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a one-to-one conversation unless one exists for the pair
    ///
    /// Returns the conversation and whether it was created by this call. The
    /// check and the insert are atomic.
    async fn get_or_insert_conversation(
        &self,
        admin_id: Uuid,
        receiver_id: Uuid,
    ) -> BackendResult<(Conversation, bool)>;

    async fn conversation(&self, id: Uuid) -> BackendResult<Option<Conversation>>;

    /// Every conversation `user_id` is a member of
    async fn conversations_for(&self, user_id: Uuid) -> BackendResult<Vec<Conversation>>;

    async fn insert_message(&self, message: NewMessage) -> BackendResult<Message>;

    async fn message(&self, id: Uuid) -> BackendResult<Option<Message>>;

    async fn count_messages(&self, chat_id: Uuid) -> BackendResult<u64>;

    /// A window of history counted from the newest end
    ///
    /// Skips the `skip` most recent messages and returns up to `limit` of the
    /// ones before them, in chronological order.
    async fn messages_from_newest(&self, chat_id: Uuid, skip: u64, limit: u64) -> BackendResult<Vec<Message>>;

    async fn last_message(&self, chat_id: Uuid) -> BackendResult<Option<Message>>;

    /// Replace the body of a message and mark it edited
    async fn update_message_body(
        &self,
        id: Uuid,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> BackendResult<Message>;
}
