//! Messaging HTTP Handlers
//!
//! Thin Axum handlers over `MessagingService`. The caller's identity comes
//! from the auth middleware via the `AuthUser` extractor; domain errors
//! surface as `BackendError` responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::messaging::service::MessagingService;
use crate::backend::middleware::AuthUser;
use crate::shared::messaging::{
    Conversation, CreateConversationRequest, EditMessageRequest, ListConversationsResponse,
    ListMessagesResponse, MarkReadRequest, Message, SendMessageRequest, UnreadCountResponse,
};

/// Query parameters for paginated listings
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a conversation (direct or group)
pub async fn create_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), BackendError> {
    let conversation = service.create_conversation(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// List the current user's conversations
pub async fn list_conversations(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<ListConversationsResponse>, BackendError> {
    let response = service
        .list_conversations(user.user_id, params.limit, params.offset)
        .await?;
    Ok(Json(response))
}

/// Get a single conversation
pub async fn get_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Conversation>, BackendError> {
    let conversation = service.get_conversation(user.user_id, conversation_id).await?;
    Ok(Json(conversation))
}

/// Leave a conversation
pub async fn leave_conversation(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, BackendError> {
    service.leave_conversation(user.user_id, conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get or create the direct conversation with another user
pub async fn get_or_create_direct(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(other_id): Path<Uuid>,
) -> Result<Json<Conversation>, BackendError> {
    let conversation = service
        .get_or_create_direct_conversation(user.user_id, other_id)
        .await?;
    Ok(Json(conversation))
}

/// Send a message to a conversation
pub async fn send_message(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), BackendError> {
    let message = service
        .send_message(user.user_id, conversation_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// List messages in a conversation, newest first
pub async fn list_messages(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListMessagesResponse>, BackendError> {
    let response = service
        .list_messages(user.user_id, conversation_id, params.limit, params.offset)
        .await?;
    Ok(Json(response))
}

/// Mark a conversation as read up to a message
pub async fn mark_read(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<MarkReadRequest>,
) -> Result<StatusCode, BackendError> {
    service
        .mark_read(user.user_id, conversation_id, request.message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Edit a message (sender only)
pub async fn edit_message(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<Message>, BackendError> {
    let message = service.edit_message(user.user_id, message_id, request).await?;
    Ok(Json(message))
}

/// Delete a message (sender only, soft)
pub async fn delete_message(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, BackendError> {
    service.delete_message(user.user_id, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Total unread count across the current user's conversations
pub async fn unread_count(
    State(service): State<MessagingService>,
    AuthUser(user): AuthUser,
) -> Result<Json<UnreadCountResponse>, BackendError> {
    let response = service.unread_count(user.user_id).await?;
    Ok(Json(response))
}
