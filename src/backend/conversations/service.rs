/**
 * Conversation & Messaging Log
 *
 * Per-user threads of ordered messages about one document. Posting a
 * message asks the reply generator first and then appends the user message
 * and the assistant reply together in one transaction, so a failed or timed
 * out reply leaves the conversation untouched.
 *
 * Ownership mismatch and absence both surface as `InvalidConversation`.
 */

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::conversations::db::{self, Conversation};
use crate::backend::conversations::replies::{call_with_timeout, ReplyGenerator};
use crate::backend::documents::db as documents_db;
use crate::backend::documents::service::DocumentEngine;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::config::begin_write;
use crate::shared::messaging::{ConversationDetail, ConversationResponse, MessageCreate, MessageRead, Role};

#[derive(Clone)]
pub struct ConversationLog {
    pool: SqlitePool,
    documents: DocumentEngine,
    replies: Arc<dyn ReplyGenerator>,
    reply_timeout: Duration,
}

impl ConversationLog {
    pub fn new(
        pool: SqlitePool,
        documents: DocumentEngine,
        replies: Arc<dyn ReplyGenerator>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            documents,
            replies,
            reply_timeout,
        }
    }

    /// Start a conversation about a document the user can see
    ///
    /// Counts as one view of the document.
    ///
    /// # Errors
    ///
    /// * `DocumentMissing` - unknown or superseded document version
    /// * `Forbidden` - someone else's private document
    pub async fn start(
        &self,
        user: &User,
        document_id: Uuid,
        title: Option<String>,
    ) -> BackendResult<ConversationResponse> {
        let document = self.documents.get_visible(document_id, Some(user)).await?;
        let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        let mut tx = begin_write(&self.pool).await?;
        if !documents_db::increment_views(&mut *tx, document.id).await? {
            return Err(BackendError::document_missing(format!(
                "no document with id {document_id}"
            )));
        }
        let conversation =
            db::insert_conversation(&mut *tx, user.id, document.id, title.as_deref()).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} started conversation {} on document {}",
            user.username,
            conversation.id,
            document.id
        );
        Ok(conversation.into())
    }

    /// The user's non-archived conversations, most recently updated first
    pub async fn list_for(&self, user: &User) -> BackendResult<Vec<ConversationResponse>> {
        let conversations = db::list_active_for(&self.pool, user.id).await?;
        Ok(conversations.into_iter().map(Into::into).collect())
    }

    /// A conversation with its messages in creation order
    pub async fn get(&self, user: &User, conversation_id: Uuid) -> BackendResult<ConversationDetail> {
        let conversation = self.owned(user, conversation_id).await?;
        let messages = db::list_messages(&self.pool, conversation.id).await?;
        Ok(ConversationDetail {
            conversation: conversation.into(),
            messages,
        })
    }

    /// Append a user message and the generated assistant reply
    ///
    /// # Returns
    /// The assistant message
    ///
    /// # Errors
    ///
    /// * `InvalidConversation` - not found or not owned
    /// * `UnprocessableInput` - non-user role or empty content
    /// * `IngestionFailure` - reply generation failed or timed out; nothing is stored
    pub async fn post_message(
        &self,
        user: &User,
        conversation_id: Uuid,
        message: MessageCreate,
    ) -> BackendResult<MessageRead> {
        if message.role != Role::User {
            return Err(BackendError::unprocessable(
                "role",
                "only user messages can be posted",
            ));
        }
        let content = message.content.trim();
        if content.is_empty() {
            return Err(BackendError::unprocessable("content", "message must not be empty"));
        }

        let conversation = self.owned(user, conversation_id).await?;
        let reply = call_with_timeout(
            self.reply_timeout,
            self.replies.generate_reply(conversation.document_id, content),
        )
        .await?;

        let mut tx = begin_write(&self.pool).await?;
        // the conversation may have been deleted while the reply was generated
        if db::get_owned(&mut *tx, user.id, conversation.id).await?.is_none() {
            return Err(BackendError::InvalidConversation);
        }
        db::insert_message(&mut *tx, conversation.id, Role::User, content).await?;
        let assistant = db::insert_message(&mut *tx, conversation.id, Role::Assistant, &reply).await?;
        db::touch(&mut *tx, conversation.id).await?;
        tx.commit().await?;

        tracing::debug!("Appended message pair to conversation {}", conversation.id);
        Ok(assistant)
    }

    pub async fn archive(&self, user: &User, conversation_id: Uuid) -> BackendResult<()> {
        if !db::archive(&self.pool, user.id, conversation_id).await? {
            return Err(BackendError::InvalidConversation);
        }
        tracing::info!("User {} archived conversation {}", user.username, conversation_id);
        Ok(())
    }

    pub async fn delete(&self, user: &User, conversation_id: Uuid) -> BackendResult<()> {
        if !db::delete(&self.pool, user.id, conversation_id).await? {
            return Err(BackendError::InvalidConversation);
        }
        tracing::info!("User {} deleted conversation {}", user.username, conversation_id);
        Ok(())
    }

    async fn owned(&self, user: &User, conversation_id: Uuid) -> BackendResult<Conversation> {
        db::get_owned(&self.pool, user.id, conversation_id)
            .await?
            .ok_or(BackendError::InvalidConversation)
    }
}
