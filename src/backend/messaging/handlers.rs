//! Messaging HTTP Handlers
//!
//! Handlers for `/api/v1/chat/individual`. Writes are persisted through the
//! services first and then handed to the gateway dispatcher for fan-out.

use axum::extract::State;
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::messaging::{ConversationService, MessageService};
use crate::backend::middleware::{ApiJson, ApiPath, AuthUser};
use crate::backend::realtime::Dispatcher;
use crate::shared::envelope::ApiResponse;
use crate::shared::messaging::{
    ChatCard, CreateChatRequest, EditMessageRequest, Message, MessagePage, SendMessageRequest,
};

/// Create or fetch the conversation with another user
///
/// 201 when the conversation was created by this call, 200 when it already existed.
pub async fn create_chat(
    State(conversations): State<ConversationService>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateChatRequest>,
) -> BackendResult<ApiResponse<ChatCard>> {
    let (conversation, created) = conversations
        .create_individual_chat(user.user_id, request.receiver_id)
        .await?;
    let card = conversations.chat_card(conversation).await?;

    if created {
        tracing::info!("[Messaging] Chat {} created by {}", card.conversation.id, user.user_id);
        Ok(ApiResponse::created(card, "Chat created"))
    } else {
        Ok(ApiResponse::ok(card, "Chat already exists"))
    }
}

/// Chat cards for every conversation of the caller, most recent activity first
pub async fn get_chats(
    State(conversations): State<ConversationService>,
    AuthUser(user): AuthUser,
) -> BackendResult<ApiResponse<Vec<ChatCard>>> {
    let cards = conversations.list_chats(user.user_id).await?;
    Ok(ApiResponse::ok(cards, "Chats fetched"))
}

/// Send a message over HTTP
///
/// The stored message is pushed to the other members' live connections.
pub async fn send_message(
    State(messages): State<MessageService>,
    State(dispatcher): State<Dispatcher>,
    AuthUser(user): AuthUser,
    ApiPath(chat_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> BackendResult<ApiResponse<Message>> {
    let message = messages
        .create_message(chat_id, user.user_id, &request.message, request.media_ref())
        .await?;

    let recipients = messages.recipients(&message).await?;
    dispatcher.publish_new_message(&message, &recipients, None);

    Ok(ApiResponse::created(message, "Message sent"))
}

/// Full history of a conversation, oldest first
pub async fn get_messages(
    State(messages): State<MessageService>,
    AuthUser(user): AuthUser,
    ApiPath(chat_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<Vec<Message>>> {
    let history = messages.list_messages(chat_id, user.user_id).await?;
    Ok(ApiResponse::ok(history, "Messages fetched"))
}

/// One page of history; page 0 holds the most recent messages
pub async fn get_sliced_messages(
    State(messages): State<MessageService>,
    AuthUser(user): AuthUser,
    ApiPath((chat_id, page)): ApiPath<(Uuid, u32)>,
) -> BackendResult<ApiResponse<MessagePage>> {
    let page = messages.list_messages_paged(chat_id, user.user_id, page).await?;
    Ok(ApiResponse::ok(page, "Messages fetched"))
}

/// Edit the body of one of the caller's messages
pub async fn edit_message(
    State(messages): State<MessageService>,
    State(dispatcher): State<Dispatcher>,
    AuthUser(user): AuthUser,
    ApiPath(message_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<EditMessageRequest>,
) -> BackendResult<ApiResponse<Message>> {
    let edited = messages
        .edit_message(message_id, user.user_id, &request.message)
        .await?;

    let recipients = messages.recipients(&edited).await?;
    dispatcher.publish_edit(&edited, &recipients);

    Ok(ApiResponse::ok(edited, "Message edited"))
}
