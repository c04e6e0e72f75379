//! Document Wire Types
//!
//! Response shapes for the document, star and ingestion endpoints, plus the
//! `IngestionStatus` tag stored on every document version.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;

/// Processing state reported by the external ingestion collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStatus {
    Pending,
    InProgress,
    Failed,
    Completed,
    Terminated,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Failed => "FAILED",
            Self::Completed => "COMPLETED",
            Self::Terminated => "TERMINATED",
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Completed | Self::Terminated)
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "FAILED" => Ok(Self::Failed),
            "COMPLETED" => Ok(Self::Completed),
            "TERMINATED" => Ok(Self::Terminated),
            _ => Err(SharedError::unknown_variant("ingestion status", s)),
        }
    }
}

/// A document version as returned by every document endpoint
///
/// `total_stars` and `user_starred` are filled from the star ledger in one
/// batched lookup per listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub document_key: String,
    pub version: i64,
    pub title: String,
    pub owner_username: String,
    pub is_private: bool,
    pub views: i64,
    pub ingestion_status: IngestionStatus,
    pub uploaded_at: DateTime<Utc>,
    pub total_stars: i64,
    pub user_starred: bool,
}

/// Aggregate counters for the caller's documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Active documents owned by the caller
    pub total_documents: i64,
    /// Active private documents owned by the caller
    pub private_documents: i64,
    /// Views summed over active documents
    pub total_views: i64,
    /// Stars received by active documents
    pub total_stars: i64,
    /// Superseded versions still on record
    pub total_revisions: i64,
}

/// Star count for one document and whether the caller starred it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarStatus {
    pub total_stars: i64,
    pub user_starred: bool,
}

/// Ingestion status of one document version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionStatusResponse {
    pub document_id: Uuid,
    pub ingestion_status: IngestionStatus,
}
