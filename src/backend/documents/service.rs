/**
 * Document Versioning & Visibility Engine
 *
 * `DocumentEngine` owns the document lifecycle: upload, re-upload as a new
 * version, deletion, visibility checks, listings and counters. Every tier
 * and ownership rule is enforced here; handlers only translate HTTP.
 *
 * # Versioning
 *
 * A lineage (one `document_key`) has exactly one active row. A re-upload
 * stores the new bytes under `{document_key}_{version + 1}`, then in one
 * transaction flips the current row inactive, clears the document reference
 * of conversations pointing at it, and inserts the new active row. If the
 * transaction fails the new bytes are removed again, so readers never see a
 * half-applied version.
 *
 * # Free Tier
 *
 * Basic accounts may hold at most `free_tier_cap` active documents. The cap
 * is checked up front for a cheap rejection and again inside the insert
 * statement itself, which is what makes it hold under concurrent uploads.
 */

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::service::authorize;
use crate::backend::auth::users::User;
use crate::backend::conversations::replies::ReplyGenerator;
use crate::backend::documents::db::{self, Document, NewDocument, PublicOrder};
use crate::backend::documents::stars;
use crate::backend::documents::storage::{version_key, DocumentStorage};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::config::begin_write;
use crate::shared::documents::{DocumentResponse, DocumentStats, StarStatus};
use crate::shared::pagination::DOCUMENTS_PER_PAGE;
use crate::shared::{AccountTier, Page};

/// A first upload
#[derive(Debug, Clone)]
pub struct UploadDocument {
    pub title: String,
    pub bytes: Bytes,
    pub is_private: bool,
}

/// A new version of an existing lineage
///
/// `title` and `is_private` default to the superseded version's values.
#[derive(Debug, Clone)]
pub struct ReuploadDocument {
    pub document_key: String,
    pub title: Option<String>,
    pub bytes: Bytes,
    pub is_private: Option<bool>,
}

/// Document lifecycle engine
#[derive(Clone)]
pub struct DocumentEngine {
    pub(crate) pool: SqlitePool,
    pub(crate) storage: Arc<dyn DocumentStorage>,
    pub(crate) replies: Arc<dyn ReplyGenerator>,
    pub(crate) free_tier_cap: i64,
    pub(crate) reply_timeout: Duration,
}

impl DocumentEngine {
    pub fn new(
        pool: SqlitePool,
        storage: Arc<dyn DocumentStorage>,
        replies: Arc<dyn ReplyGenerator>,
        free_tier_cap: i64,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            storage,
            replies,
            free_tier_cap,
            reply_timeout,
        }
    }

    /// Upload a new document as version 1 of a fresh lineage
    ///
    /// # Errors
    ///
    /// * `UnprocessableInput` - empty title or file
    /// * `TierLimitExceeded` - a Basic user already holds the capped number of documents
    pub async fn upload(&self, user: &User, upload: UploadDocument) -> BackendResult<Document> {
        let title = non_empty_title(&upload.title)?;
        if upload.bytes.is_empty() {
            return Err(BackendError::unprocessable("file", "uploaded file is empty"));
        }

        let cap = user.account_tier.is_capped().then_some(self.free_tier_cap);
        if let Some(cap) = cap {
            let active: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM documents WHERE user_id = ? AND is_active = 1",
            )
            .bind(user.id)
            .fetch_one(&self.pool)
            .await?;
            if active >= cap {
                tracing::info!("Upload by {} rejected at free tier cap {}", user.username, cap);
                return Err(BackendError::TierLimitExceeded { limit: cap });
            }
        }

        let document_key = Uuid::new_v4().to_string();
        let locator = self.store(&version_key(&document_key, 1), upload.bytes).await?;
        let new_document = NewDocument {
            id: Uuid::new_v4(),
            document_key,
            version: 1,
            title,
            storage_locator: locator.clone(),
            user_id: user.id,
            is_private: upload.is_private,
        };

        match db::insert_document(&self.pool, &new_document, cap).await {
            Ok(true) => {}
            Ok(false) => {
                self.discard(&locator).await;
                return Err(BackendError::TierLimitExceeded {
                    limit: cap.unwrap_or(self.free_tier_cap),
                });
            }
            Err(e) => {
                self.discard(&locator).await;
                return Err(e.into());
            }
        }

        tracing::info!(
            "User {} uploaded document {} (v1)",
            user.username,
            new_document.document_key
        );
        self.get_by_id(new_document.id).await
    }

    /// Upload a new version of an existing lineage
    ///
    /// # Errors
    ///
    /// * `Forbidden` - caller below Premium, or not the owner
    /// * `DocumentMissing` - no active version for the key
    /// * `Conflict` - another re-upload of the same lineage won the race
    pub async fn reupload(&self, user: &User, reupload: ReuploadDocument) -> BackendResult<Document> {
        authorize(user, AccountTier::Premium, "re-uploading documents")?;
        if reupload.bytes.is_empty() {
            return Err(BackendError::unprocessable("file", "uploaded file is empty"));
        }
        let title = reupload.title.as_deref().map(non_empty_title).transpose()?;

        let current = self.get_by_key(&reupload.document_key).await?;
        if !current.is_owned_by(user.id) {
            return Err(BackendError::forbidden("only the owner can re-upload a document"));
        }

        let version = current.version + 1;
        let new_document = NewDocument {
            id: Uuid::new_v4(),
            document_key: current.document_key.clone(),
            version,
            title: title.unwrap_or_else(|| current.title.clone()),
            storage_locator: version_key(&current.document_key, version),
            user_id: user.id,
            is_private: reupload.is_private.unwrap_or(current.is_private),
        };

        self.supersede(&current, &new_document, reupload.bytes).await?;

        tracing::info!(
            "User {} re-uploaded document {} as v{}",
            user.username,
            current.document_key,
            version
        );
        self.get_by_id(new_document.id).await
    }

    /// Flip `current` inactive, store the bytes of `next` and insert it as the
    /// active version, atomically
    ///
    /// The bytes are written while the write lock is held, so a blob already
    /// sitting at the new locator cannot belong to a request in flight.
    async fn supersede(&self, current: &Document, next: &NewDocument, bytes: Bytes) -> BackendResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        if !db::deactivate(&mut *tx, current.id).await? {
            return Err(BackendError::conflict(
                "the document was modified by another request",
            ));
        }
        self.store_version(&next.storage_locator, bytes).await?;

        let committed = async move {
            let detached = db::detach_conversations(&mut *tx, current.id).await?;
            db::insert_document(&mut *tx, next, None).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(detached)
        }
        .await;

        match committed {
            Ok(detached) => {
                tracing::debug!(
                    "Superseded document {} v{} ({} conversations detached)",
                    current.document_key,
                    current.version,
                    detached
                );
                Ok(())
            }
            Err(e) => {
                self.discard(&next.storage_locator).await;
                Err(e.into())
            }
        }
    }

    /// Write the bytes of a new version, replacing an orphan left by an
    /// earlier attempt that never committed
    async fn store_version(&self, locator: &str, bytes: Bytes) -> BackendResult<()> {
        match self.storage.put(locator, bytes.clone()).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!("Replacing orphaned stored document {}", locator);
                self.storage.delete(locator).await.map_err(BackendError::Storage)?;
                self.storage.put(locator, bytes).await.map_err(BackendError::Storage)?;
                Ok(())
            }
            Err(e) => Err(BackendError::Storage(e)),
        }
    }

    /// The active version of a lineage
    ///
    /// # Errors
    /// `DocumentMissing` if the lineage has no active version
    pub async fn get_by_key(&self, document_key: &str) -> BackendResult<Document> {
        db::get_active_by_key(&self.pool, document_key)
            .await?
            .ok_or_else(|| BackendError::document_missing(format!("no document with key {document_key}")))
    }

    /// The active version of a lineage, if the requester may see it
    ///
    /// # Errors
    ///
    /// * `DocumentMissing` - no active version
    /// * `Forbidden` - private and the requester is not the owner (anonymous included)
    pub async fn get(&self, document_key: &str, requester: Option<&User>) -> BackendResult<Document> {
        let document = self.get_by_key(document_key).await?;
        if !document.is_visible_to(requester.map(|u| u.id)) {
            return Err(BackendError::forbidden("this document is private"));
        }
        Ok(document)
    }

    /// Any version by id, active or superseded
    pub async fn get_by_id(&self, document_id: Uuid) -> BackendResult<Document> {
        db::get_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| BackendError::document_missing(format!("no document with id {document_id}")))
    }

    /// An active version by id that `viewer` may see
    pub async fn get_visible(&self, document_id: Uuid, viewer: Option<&User>) -> BackendResult<Document> {
        let document = self.get_by_id(document_id).await?;
        if !document.is_active {
            return Err(BackendError::document_missing(format!(
                "document {document_id} has been superseded"
            )));
        }
        if !document.is_visible_to(viewer.map(|u| u.id)) {
            return Err(BackendError::forbidden("this document is private"));
        }
        Ok(document)
    }

    /// Delete a lineage with all its versions and stored bytes
    ///
    /// Conversations keep existing with their document reference cleared.
    ///
    /// # Errors
    ///
    /// * `DocumentMissing` - no active version
    /// * `Forbidden` - caller is not the owner
    pub async fn delete(&self, user: &User, document_key: &str) -> BackendResult<()> {
        let document = self.get_by_key(document_key).await?;
        if !document.is_owned_by(user.id) {
            return Err(BackendError::forbidden("only the owner can delete a document"));
        }

        let mut tx = begin_write(&self.pool).await?;
        let locators = db::lineage_locators(&mut *tx, document_key).await?;
        let removed = db::delete_lineage(&mut *tx, document_key).await?;
        tx.commit().await?;

        for locator in &locators {
            self.discard(locator).await;
        }
        tracing::info!(
            "User {} deleted document {} ({} versions)",
            user.username,
            document_key,
            removed
        );
        Ok(())
    }

    /// The caller's own active documents, private ones included
    pub async fn list_owned(&self, user: &User) -> BackendResult<Vec<DocumentResponse>> {
        let documents = db::list_active_for_owner(&self.pool, user.id, true, None, 0).await?;
        self.decorate(documents, Some(user)).await
    }

    /// Active documents of `owner`; private ones only when the viewer is the owner
    pub async fn list_for_user(
        &self,
        owner: &User,
        viewer: Option<&User>,
        page: Page,
    ) -> BackendResult<Vec<DocumentResponse>> {
        let include_private = viewer.is_some_and(|v| v.id == owner.id);
        let (limit, offset) = page.limit_offset(DOCUMENTS_PER_PAGE);
        let documents =
            db::list_active_for_owner(&self.pool, owner.id, include_private, Some(limit), offset)
                .await?;
        self.decorate(documents, viewer).await
    }

    /// Public documents, most viewed first
    pub async fn explore(&self, viewer: Option<&User>, page: Page) -> BackendResult<Vec<DocumentResponse>> {
        self.list_public(PublicOrder::Explore, viewer, page).await
    }

    /// Public documents, most starred first
    pub async fn trending(&self, viewer: Option<&User>, page: Page) -> BackendResult<Vec<DocumentResponse>> {
        self.list_public(PublicOrder::Trending, viewer, page).await
    }

    /// Public documents, newest first
    pub async fn latest(&self, viewer: Option<&User>, page: Page) -> BackendResult<Vec<DocumentResponse>> {
        self.list_public(PublicOrder::Latest, viewer, page).await
    }

    async fn list_public(
        &self,
        order: PublicOrder,
        viewer: Option<&User>,
        page: Page,
    ) -> BackendResult<Vec<DocumentResponse>> {
        let (limit, offset) = page.limit_offset(DOCUMENTS_PER_PAGE);
        let documents = db::list_public(&self.pool, order, limit, offset).await?;
        self.decorate(documents, viewer).await
    }

    /// Count one view of a document
    pub async fn record_view(&self, document_id: Uuid) -> BackendResult<()> {
        if !db::increment_views(&self.pool, document_id).await? {
            return Err(BackendError::document_missing(format!(
                "no document with id {document_id}"
            )));
        }
        Ok(())
    }

    pub async fn stats(&self, user: &User) -> BackendResult<DocumentStats> {
        Ok(db::stats_for_owner(&self.pool, user.id).await?)
    }

    /// Star a visible active document; repeating the star is a no-op
    pub async fn star(&self, user: &User, document_id: Uuid) -> BackendResult<()> {
        let document = self.get_visible(document_id, Some(user)).await?;
        if stars::star(&self.pool, user.id, document.id).await? {
            tracing::debug!("User {} starred document {}", user.username, document.id);
        }
        Ok(())
    }

    /// Remove a star; a missing star is a no-op
    pub async fn unstar(&self, user: &User, document_id: Uuid) -> BackendResult<()> {
        stars::unstar(&self.pool, user.id, document_id).await?;
        Ok(())
    }

    pub async fn star_status(&self, viewer: &User, document_id: Uuid) -> BackendResult<StarStatus> {
        let document = self.get_visible(document_id, Some(viewer)).await?;
        let counts = stars::counts_for(&self.pool, &[document.id]).await?;
        let starred = stars::starred_by(&self.pool, viewer.id, &[document.id]).await?;
        Ok(StarStatus {
            total_stars: counts.get(&document.id).copied().unwrap_or(0),
            user_starred: starred.contains(&document.id),
        })
    }

    /// Attach star counts and the viewer's starred flag to a page of documents
    pub async fn decorate(
        &self,
        documents: Vec<Document>,
        viewer: Option<&User>,
    ) -> BackendResult<Vec<DocumentResponse>> {
        let ids: Vec<Uuid> = documents.iter().map(|d| d.id).collect();
        let counts = stars::counts_for(&self.pool, &ids).await?;
        let starred = match viewer {
            Some(viewer) => stars::starred_by(&self.pool, viewer.id, &ids).await?,
            None => Default::default(),
        };

        Ok(documents
            .into_iter()
            .map(|document| {
                let total_stars = counts.get(&document.id).copied().unwrap_or(0);
                let user_starred = starred.contains(&document.id);
                document.into_response(total_stars, user_starred)
            })
            .collect())
    }

    async fn store(&self, key: &str, bytes: Bytes) -> BackendResult<String> {
        self.storage.put(key, bytes).await.map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                BackendError::conflict("this document version is already being stored")
            } else {
                BackendError::Storage(e)
            }
        })
    }

    /// Best-effort removal of stored bytes
    async fn discard(&self, locator: &str) {
        if let Err(e) = self.storage.delete(locator).await {
            tracing::warn!("Failed to remove stored document {}: {}", locator, e);
        }
    }
}

impl Document {
    pub fn into_response(self, total_stars: i64, user_starred: bool) -> DocumentResponse {
        DocumentResponse {
            id: self.id,
            document_key: self.document_key,
            version: self.version,
            title: self.title,
            owner_username: self.owner_username,
            is_private: self.is_private,
            views: self.views,
            ingestion_status: self.ingestion_status,
            uploaded_at: self.uploaded_at,
            total_stars,
            user_starred,
        }
    }
}

fn non_empty_title(title: &str) -> BackendResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BackendError::unprocessable("title", "title must not be empty"));
    }
    Ok(title.to_string())
}
