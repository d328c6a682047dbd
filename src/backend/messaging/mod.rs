//! Messaging Module
//!
//! One-to-one conversations and their messages.
//!
//! - **`db`** - Postgres queries for conversations and messages
//! - **`conversations`** - Conversation creation and chat cards
//! - **`service`** - Message service (create, list, page, edit)
//! - **`handlers`** - HTTP handlers under `/chat/individual`

pub mod conversations;
pub mod db;
pub mod handlers;
pub mod service;

pub use conversations::ConversationService;
pub use service::MessageService;
