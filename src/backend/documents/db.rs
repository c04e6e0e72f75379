/**
 * Document Database Operations
 *
 * Queries over the `documents` table. A lineage is every row sharing one
 * `document_key`; the partial unique index
 * `idx_documents_one_active_version` guarantees at most one active row per
 * lineage, so a racing supersede fails with a unique violation instead of
 * leaving two active versions.
 *
 * Every read joins `users` for the owner's username.
 */

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor};
use uuid::Uuid;

use crate::shared::documents::{DocumentStats, IngestionStatus};

/// One document version row
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub document_key: String,
    pub version: i64,
    pub title: String,
    pub storage_locator: String,
    pub user_id: Uuid,
    pub owner_username: String,
    pub is_private: bool,
    pub is_active: bool,
    pub views: i64,
    pub ingestion_status: IngestionStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Whether a viewer (or an anonymous caller) may read this version
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        !self.is_private || viewer == Some(self.user_id)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Document {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("ingestion_status")?;
        Ok(Self {
            id: row.try_get("id")?,
            document_key: row.try_get("document_key")?,
            version: row.try_get("version")?,
            title: row.try_get("title")?,
            storage_locator: row.try_get("storage_locator")?,
            user_id: row.try_get("user_id")?,
            owner_username: row.try_get("owner_username")?,
            is_private: row.try_get("is_private")?,
            is_active: row.try_get("is_active")?,
            views: row.try_get("views")?,
            ingestion_status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "ingestion_status".to_string(),
                source: Box::new(e),
            })?,
            uploaded_at: row.try_get("uploaded_at")?,
        })
    }
}

/// Fields for a new version row
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub document_key: String,
    pub version: i64,
    pub title: String,
    pub storage_locator: String,
    pub user_id: Uuid,
    pub is_private: bool,
}

/// Sort order of the public listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicOrder {
    /// Most viewed first
    Explore,
    /// Most starred first
    Trending,
    /// Newest first
    Latest,
}

impl PublicOrder {
    fn order_by(&self) -> &'static str {
        match self {
            Self::Explore => "d.views DESC, d.uploaded_at DESC, d.rowid DESC",
            Self::Trending => {
                "(SELECT COUNT(*) FROM document_stars s WHERE s.document_id = d.id) DESC, d.uploaded_at DESC, d.rowid DESC"
            }
            Self::Latest => "d.uploaded_at DESC, d.rowid DESC",
        }
    }
}

const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.document_key, d.version, d.title, d.storage_locator, d.user_id,
           u.username AS owner_username, d.is_private, d.is_active, d.views,
           d.ingestion_status, d.uploaded_at
    FROM documents d
    JOIN users u ON u.id = d.user_id
"#;

/// Insert a version row, optionally enforcing an active-document cap
///
/// The count and the insert run as one statement, so concurrent uploads from
/// the same user cannot both slip under the cap.
///
/// # Arguments
/// * `cap` - Maximum active documents the owner may already hold; `None` for no cap
///
/// # Returns
/// `false` when the cap blocked the insert
pub async fn insert_document(
    executor: impl SqliteExecutor<'_>,
    document: &NewDocument,
    cap: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO documents
            (id, document_key, version, title, storage_locator, user_id, is_private, is_active, views, ingestion_status, uploaded_at)
        SELECT ?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?
        WHERE ? IS NULL
           OR (SELECT COUNT(*) FROM documents WHERE user_id = ? AND is_active = 1) < ?
        "#,
    )
    .bind(document.id)
    .bind(&document.document_key)
    .bind(document.version)
    .bind(&document.title)
    .bind(&document.storage_locator)
    .bind(document.user_id)
    .bind(document.is_private)
    .bind(IngestionStatus::Pending.as_str())
    .bind(Utc::now())
    .bind(cap)
    .bind(document.user_id)
    .bind(cap)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Get the active version of a lineage
pub async fn get_active_by_key(
    executor: impl SqliteExecutor<'_>,
    document_key: &str,
) -> Result<Option<Document>, sqlx::Error> {
    let document = sqlx::query_as::<_, Document>(&format!(
        "{DOCUMENT_SELECT} WHERE d.document_key = ? AND d.is_active = 1"
    ))
    .bind(document_key)
    .fetch_optional(executor)
    .await?;

    Ok(document)
}

/// Get any version (active or superseded) by id
pub async fn get_by_id(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
) -> Result<Option<Document>, sqlx::Error> {
    let document = sqlx::query_as::<_, Document>(&format!("{DOCUMENT_SELECT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(document)
}

/// Flip an active row to inactive; `false` if it was not active
pub async fn deactivate(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE documents SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Clear the document reference on every conversation pointing at `document_id`
pub async fn detach_conversations(
    executor: impl SqliteExecutor<'_>,
    document_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE conversations SET document_id = NULL WHERE document_id = ?")
        .bind(document_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Storage locators of every version in a lineage
pub async fn lineage_locators(
    executor: impl SqliteExecutor<'_>,
    document_key: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let locators = sqlx::query_scalar("SELECT storage_locator FROM documents WHERE document_key = ?")
        .bind(document_key)
        .fetch_all(executor)
        .await?;
    Ok(locators)
}

/// Delete every version of a lineage
pub async fn delete_lineage(
    executor: impl SqliteExecutor<'_>,
    document_key: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM documents WHERE document_key = ?")
        .bind(document_key)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Storage locators of every version owned by a user
pub async fn locators_for_owner(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    let locators = sqlx::query_scalar("SELECT storage_locator FROM documents WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(executor)
        .await?;
    Ok(locators)
}

/// Active documents of one owner, newest first
///
/// # Arguments
/// * `include_private` - Whether private documents are returned
/// * `limit` - Page size; `None` returns every row
pub async fn list_active_for_owner(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
    include_private: bool,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Document>, sqlx::Error> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        r#"{DOCUMENT_SELECT}
        WHERE d.user_id = ? AND d.is_active = 1 AND (? OR d.is_private = 0)
        ORDER BY d.uploaded_at DESC, d.rowid DESC
        LIMIT ? OFFSET ?"#
    ))
    .bind(user_id)
    .bind(include_private)
    .bind(limit.unwrap_or(-1))
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(documents)
}

/// Active public documents in the given order
pub async fn list_public(
    executor: impl SqliteExecutor<'_>,
    order: PublicOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<Document>, sqlx::Error> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        r#"{DOCUMENT_SELECT}
        WHERE d.is_active = 1 AND d.is_private = 0
        ORDER BY {}
        LIMIT ? OFFSET ?"#,
        order.order_by()
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;

    Ok(documents)
}

/// Increment the view counter of an active version
///
/// Returns `false` if the row does not exist or has been superseded.
pub async fn increment_views(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE documents SET views = views + 1 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_ingestion_status(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    status: IngestionStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE documents SET ingestion_status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Aggregate counters over one owner's documents
pub async fn stats_for_owner(
    executor: impl SqliteExecutor<'_>,
    user_id: Uuid,
) -> Result<DocumentStats, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN d.is_active = 1 THEN 1 ELSE 0 END), 0) AS total_documents,
            COALESCE(SUM(CASE WHEN d.is_active = 1 AND d.is_private = 1 THEN 1 ELSE 0 END), 0) AS private_documents,
            COALESCE(SUM(CASE WHEN d.is_active = 1 THEN d.views ELSE 0 END), 0) AS total_views,
            COALESCE(SUM(CASE WHEN d.is_active = 0 THEN 1 ELSE 0 END), 0) AS total_revisions,
            (SELECT COUNT(*) FROM document_stars s
                JOIN documents sd ON sd.id = s.document_id
                WHERE sd.user_id = ? AND sd.is_active = 1) AS total_stars
        FROM documents d
        WHERE d.user_id = ?
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(DocumentStats {
        total_documents: row.try_get("total_documents")?,
        private_documents: row.try_get("private_documents")?,
        total_views: row.try_get("total_views")?,
        total_stars: row.try_get("total_stars")?,
        total_revisions: row.try_get("total_revisions")?,
    })
}
