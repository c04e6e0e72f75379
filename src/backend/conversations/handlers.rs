/**
 * Conversation Handlers
 *
 * - `GET    /conversations` - the caller's non-archived conversations
 * - `POST   /conversations` - start a conversation on a document
 * - `GET    /conversations/{id}` - conversation with messages
 * - `POST   /conversations/{id}` - post a message, returns the assistant reply
 * - `DELETE /conversations/{id}`
 * - `POST   /conversations/{id}/archive`
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::conversations::service::ConversationLog;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiJson, ApiPath, AuthUser};
use crate::shared::messaging::{
    ConversationCreateRequest, ConversationDetail, ConversationResponse, MessageCreate, MessageRead,
};

pub async fn list_conversations(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<ConversationResponse>>> {
    Ok(Json(conversations.list_for(&user).await?))
}

pub async fn start_conversation(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<ConversationCreateRequest>,
) -> BackendResult<(StatusCode, Json<ConversationResponse>)> {
    let conversation = conversations
        .start(&user, request.document_id, request.title)
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn get_conversation(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
    ApiPath(conversation_id): ApiPath<Uuid>,
) -> BackendResult<Json<ConversationDetail>> {
    Ok(Json(conversations.get(&user, conversation_id).await?))
}

pub async fn post_message(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
    ApiPath(conversation_id): ApiPath<Uuid>,
    ApiJson(message): ApiJson<MessageCreate>,
) -> BackendResult<(StatusCode, Json<MessageRead>)> {
    let reply = conversations
        .post_message(&user, conversation_id, message)
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn archive_conversation(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
    ApiPath(conversation_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    conversations.archive(&user, conversation_id).await?;
    Ok(Json(MessageResponse::new("Conversation archived")))
}

pub async fn delete_conversation(
    State(conversations): State<ConversationLog>,
    AuthUser(user): AuthUser,
    ApiPath(conversation_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    conversations.delete(&user, conversation_id).await?;
    Ok(Json(MessageResponse::new("Conversation deleted")))
}
