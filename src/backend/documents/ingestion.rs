/**
 * Ingestion Status
 *
 * Uploaded versions are ingested by the reply backend before they can be
 * asked about. Each row caches the last known state; terminal states are
 * served from the row, anything else is refreshed from the backend.
 */

use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::conversations::replies::call_with_timeout;
use crate::backend::documents::db::{self, Document};
use crate::backend::documents::service::DocumentEngine;
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::documents::{IngestionStatus, IngestionStatusResponse};

impl DocumentEngine {
    /// Current ingestion state of one of the caller's document versions
    ///
    /// # Errors
    ///
    /// * `DocumentMissing` - unknown id
    /// * `Forbidden` - caller is not the owner
    /// * `IngestionFailure` - the backend failed or timed out
    pub async fn ingestion_status(
        &self,
        user: &User,
        document_id: Uuid,
    ) -> BackendResult<IngestionStatusResponse> {
        let document = self.owned_document(user, document_id).await?;
        if document.ingestion_status.is_terminal() {
            return Ok(status_response(&document, document.ingestion_status));
        }

        let status = call_with_timeout(
            self.reply_timeout,
            self.replies.ingestion_status(document.id),
        )
        .await?;
        if status != document.ingestion_status {
            db::set_ingestion_status(&self.pool, document.id, status).await?;
            tracing::debug!(
                "Document {} ingestion {} -> {}",
                document.id,
                document.ingestion_status,
                status
            );
        }
        Ok(status_response(&document, status))
    }

    /// Stop ingestion of one of the caller's document versions
    ///
    /// Completed and failed ingestions are left as they are.
    pub async fn cancel_ingestion(
        &self,
        user: &User,
        document_id: Uuid,
    ) -> BackendResult<IngestionStatusResponse> {
        let document = self.owned_document(user, document_id).await?;
        if document.ingestion_status.is_terminal() {
            return Ok(status_response(&document, document.ingestion_status));
        }

        call_with_timeout(
            self.reply_timeout,
            self.replies.cancel_ingestion(document.id),
        )
        .await?;
        db::set_ingestion_status(&self.pool, document.id, IngestionStatus::Terminated).await?;
        tracing::info!("User {} cancelled ingestion of {}", user.username, document.id);

        Ok(status_response(&document, IngestionStatus::Terminated))
    }

    async fn owned_document(&self, user: &User, document_id: Uuid) -> BackendResult<Document> {
        let document = self.get_by_id(document_id).await?;
        if !document.is_owned_by(user.id) {
            return Err(BackendError::forbidden(
                "only the owner can manage a document's ingestion",
            ));
        }
        Ok(document)
    }
}

fn status_response(document: &Document, status: IngestionStatus) -> IngestionStatusResponse {
    IngestionStatusResponse {
        document_id: document.id,
        ingestion_status: status,
    }
}
