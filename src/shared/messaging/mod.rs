//! Messaging Module
//!
//! This module contains all the data structures for the messaging system:
//!
//! - `UserSummary` - Public view of a user
//! - `Conversation` / `ChatCard` - A one-to-one conversation and its list projection
//! - `Message` / `MessagePage` - A message and one page of history
//!
//! # Usage
//!
//! ```rust
//! use chatline::shared::messaging::{Conversation, Message, UserSummary};
//! ```

pub mod conversation;
pub mod message;
pub mod user;

// Re-export all types
pub use conversation::{pair_key, ChatCard, Conversation, CreateChatRequest};
pub use message::{
    media_ref, validate_content, EditMessageRequest, MediaKind, MediaRef, Message, MessagePage,
    SendMessageRequest, MAX_MESSAGE_CHARS,
};
pub use user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, TokenResponse,
    UpdateAccountRequest, UserSummary,
};
