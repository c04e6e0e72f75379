//! Database operations for conversations and messages
//!
//! Every conversation query is scoped by owner: a row owned by someone else
//! is indistinguishable from a missing one.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor};
use uuid::Uuid;

use crate::shared::messaging::{ConversationResponse, MessageRead, Role};

/// Conversation row
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Cleared when the document version is superseded or deleted
    pub document_id: Option<Uuid>,
    pub title: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Conversation {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            document_id: row.try_get("document_id")?,
            title: row.try_get("title")?,
            is_archived: row.try_get("is_archived")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            document_id: conversation.document_id,
            title: conversation.title,
            is_archived: conversation.is_archived,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

fn message_from_row(row: &SqliteRow) -> Result<MessageRead, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(MessageRead {
        id: row.try_get("id")?,
        role: role.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: Box::new(e),
        })?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

const CONVERSATION_COLUMNS: &str = "id, user_id, document_id, title, is_archived, created_at, updated_at";

pub async fn insert_conversation(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    document_id: Uuid,
    title: Option<&str>,
) -> Result<Conversation, sqlx::Error> {
    let now = Utc::now();
    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        r#"
        INSERT INTO conversations (id, user_id, document_id, title, is_archived, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        RETURNING {CONVERSATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(document_id)
    .bind(title)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(conversation)
}

/// Get a conversation if `user_id` owns it
pub async fn get_owned(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(conversation)
}

/// Non-archived conversations of a user, most recently updated first
pub async fn list_active_for(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let conversations = sqlx::query_as::<_, Conversation>(&format!(
        r#"
        SELECT {CONVERSATION_COLUMNS} FROM conversations
        WHERE user_id = ? AND is_archived = 0
        ORDER BY updated_at DESC, rowid DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(conversations)
}

pub async fn insert_message(
    executor: impl SqliteExecutor<'_>,
    conversation_id: Uuid,
    role: Role,
    content: &str,
) -> Result<MessageRead, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, role, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, role, content, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(content)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    message_from_row(&row)
}

/// Messages of a conversation in creation order
pub async fn list_messages(
    executor: impl SqliteExecutor<'_>,
    conversation_id: Uuid,
) -> Result<Vec<MessageRead>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, role, content, created_at FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(message_from_row).collect()
}

/// Bump `updated_at`
pub async fn touch(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Archive an owned conversation; `false` if not found or not owned
pub async fn archive(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE conversations SET is_archived = 1, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Delete an owned conversation and its messages; `false` if not found or not owned
pub async fn delete(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}
