/**
 * Reply Generator
 *
 * The language-model backend is an external collaborator reached through
 * the `ReplyGenerator` capability. It answers prompts about a document and
 * reports the ingestion state of uploaded documents.
 *
 * # Implementations
 *
 * - `StubReplyGenerator` - deterministic replies, ingestion always complete
 * - `HttpReplyGenerator` - JSON over HTTP (reqwest)
 *
 * # HTTP Contract
 *
 * ```text
 * POST   {base}/reply            {"document_id": uuid|null, "prompt": str} -> {"reply": str}
 * GET    {base}/ingestion/{id}   -> {"status": "PENDING" | "IN_PROGRESS" | ...}
 * DELETE {base}/ingestion/{id}   -> 2xx
 * ```
 *
 * Callers bound every call with `call_with_timeout`.
 */

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::documents::IngestionStatus;

/// Errors reported by a reply backend
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reply backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

impl From<ReplyError> for BackendError {
    fn from(err: ReplyError) -> Self {
        BackendError::ingestion(err.to_string())
    }
}

/// Language-model capability
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Answer `prompt` in the context of a document
    ///
    /// `document_id` is `None` once the conversation's document has been
    /// superseded or deleted.
    async fn generate_reply(&self, document_id: Option<Uuid>, prompt: &str) -> Result<String, ReplyError>;

    /// Current ingestion state of a document version
    async fn ingestion_status(&self, document_id: Uuid) -> Result<IngestionStatus, ReplyError>;

    /// Stop ingesting a document version
    async fn cancel_ingestion(&self, document_id: Uuid) -> Result<(), ReplyError>;
}

/// Run a backend call under a deadline
///
/// # Errors
/// `IngestionFailure` if the call fails, or its timeout variant if the
/// deadline passes first
pub async fn call_with_timeout<T, F>(limit: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, ReplyError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|e| {
            tracing::warn!("Reply backend call failed: {}", e);
            BackendError::from(e)
        }),
        Err(_) => {
            tracing::warn!("Reply backend call timed out after {:?}", limit);
            Err(BackendError::ingestion_timeout(format!(
                "reply backend did not answer within {}s",
                limit.as_secs()
            )))
        }
    }
}

/// Deterministic generator for development and tests
#[derive(Debug, Default, Clone)]
pub struct StubReplyGenerator;

#[async_trait]
impl ReplyGenerator for StubReplyGenerator {
    async fn generate_reply(&self, document_id: Option<Uuid>, prompt: &str) -> Result<String, ReplyError> {
        Ok(match document_id {
            Some(id) => format!("Answer about document {id}: {prompt}"),
            None => format!("The document for this conversation is no longer available. You asked: {prompt}"),
        })
    }

    async fn ingestion_status(&self, _document_id: Uuid) -> Result<IngestionStatus, ReplyError> {
        Ok(IngestionStatus::Completed)
    }

    async fn cancel_ingestion(&self, _document_id: Uuid) -> Result<(), ReplyError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    document_id: Option<Uuid>,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ReplyResponse {
    reply: String,
}

#[derive(Deserialize)]
struct IngestionResponse {
    status: IngestionStatus,
}

/// Reply backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpReplyGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReplyGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ReplyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ReplyError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate_reply(&self, document_id: Option<Uuid>, prompt: &str) -> Result<String, ReplyError> {
        let response = self
            .client
            .post(format!("{}/reply", self.base_url))
            .json(&ReplyRequest { document_id, prompt })
            .send()
            .await?;
        let body: ReplyResponse = Self::check(response).await?.json().await?;
        Ok(body.reply)
    }

    async fn ingestion_status(&self, document_id: Uuid) -> Result<IngestionStatus, ReplyError> {
        let response = self
            .client
            .get(format!("{}/ingestion/{}", self.base_url, document_id))
            .send()
            .await?;
        let body: IngestionResponse = Self::check(response).await?.json().await?;
        Ok(body.status)
    }

    async fn cancel_ingestion(&self, document_id: Uuid) -> Result<(), ReplyError> {
        let response = self
            .client
            .delete(format!("{}/ingestion/{}", self.base_url, document_id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
