/**
 * Backend Error Types
 *
 * This module defines the single error type used by every service and
 * handler in the backend. Business-rule violations are raised as typed
 * variants at the point of detection; infrastructure failures wrap their
 * source error.
 *
 * # Error Categories
 *
 * ## Identity
 *
 * - `Conflict` - duplicate username or email
 * - `InvalidCredentials` - unknown username or wrong password
 * - `AccountDeactivated` - the account exists but is switched off
 * - `InvalidAuthToken` - missing, malformed, tampered or expired token
 *
 * ## Entitlement
 *
 * - `Forbidden` - tier or ownership insufficient
 * - `TierLimitExceeded` - the free-tier document cap is reached
 *
 * ## Lookup
 *
 * - `NotFound` - user or other record absent
 * - `DocumentMissing` - no active document for a key or id
 * - `InvalidConversation` - conversation absent or owned by someone else;
 *   the two cases carry the same message
 *
 * ## Input and collaborators
 *
 * - `UnprocessableInput` - malformed request parameters
 * - `IngestionFailure` - the reply/ingestion collaborator failed or timed out
 *
 * ## Infrastructure
 *
 * - `Database`, `Storage`, `Token`, `Internal`
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend error type
///
/// Each variant maps to a stable HTTP status code and a machine-checkable
/// `kind` string.
///
/// # Usage
///
/// ```rust
/// use docqa::backend::error::BackendError;
///
/// let err = BackendError::forbidden("Premium tier required");
/// assert_eq!(err.kind(), "forbidden");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// A unique value is already taken
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    /// Missing, malformed or expired bearer token
    #[error("Invalid authentication token: {message}")]
    InvalidAuthToken { message: String },

    /// Tier or ownership insufficient for a valid principal
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Document not found: {message}")]
    DocumentMissing { message: String },

    #[error("Conversation not found")]
    InvalidConversation,

    #[error("Free tier limit reached: {limit} active documents")]
    TierLimitExceeded { limit: i64 },

    #[error("Unprocessable input in '{field}': {message}")]
    UnprocessableInput { field: String, message: String },

    /// Failure of the external reply/ingestion collaborator
    #[error("Ingestion failure: {message}")]
    IngestionFailure {
        message: String,
        /// The call was abandoned after the configured timeout
        timed_out: bool,
    },

    #[error(transparent)]
    Shared(#[from] SharedError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BackendError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidAuthToken {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn document_missing(message: impl Into<String>) -> Self {
        Self::DocumentMissing {
            message: message.into(),
        }
    }

    /// Create a new unprocessable-input error
    ///
    /// # Arguments
    ///
    /// * `field` - Name of the offending request field
    /// * `message` - Error message
    pub fn unprocessable(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnprocessableInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::IngestionFailure {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn ingestion_timeout(message: impl Into<String>) -> Self {
        Self::IngestionFailure {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Conflict` - 409
    /// - `InvalidCredentials`, `InvalidAuthToken` - 401
    /// - `AccountDeactivated`, `Forbidden`, `TierLimitExceeded` - 403
    /// - `NotFound`, `DocumentMissing`, `InvalidConversation` - 404
    /// - `UnprocessableInput`, `Shared` - 422
    /// - `IngestionFailure` - 502, or 504 after a timeout
    /// - infrastructure variants - 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::InvalidAuthToken { .. } => StatusCode::UNAUTHORIZED,
            Self::AccountDeactivated | Self::Forbidden { .. } | Self::TierLimitExceeded { .. } => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound { .. } | Self::DocumentMissing { .. } | Self::InvalidConversation => {
                StatusCode::NOT_FOUND
            }
            Self::UnprocessableInput { .. } | Self::Shared(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::IngestionFailure { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::IngestionFailure { .. } => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Storage(_) | Self::Token(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable, machine-checkable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountDeactivated => "account_deactivated",
            Self::InvalidAuthToken { .. } => "invalid_auth_token",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::DocumentMissing { .. } => "document_missing",
            Self::InvalidConversation => "invalid_conversation",
            Self::TierLimitExceeded { .. } => "tier_limit_exceeded",
            Self::UnprocessableInput { .. } | Self::Shared(_) => "unprocessable_input",
            Self::IngestionFailure { .. } => "ingestion_failure",
            Self::Database(_) | Self::Storage(_) | Self::Token(_) | Self::Internal { .. } => {
                "internal"
            }
        }
    }

    /// Human-readable message safe to return to clients
    ///
    /// Infrastructure failures collapse to a generic message; their details
    /// are logged when the response is built.
    pub fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Storage(_) | Self::Token(_) | Self::Internal { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether the error is an infrastructure failure rather than a rule violation
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<sqlx::Error> for BackendError {
    /// Unique-constraint races surface as `Conflict`, missing rows as `NotFound`
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::conflict(db_err.message().to_string());
            }
        }
        match err {
            sqlx::Error::RowNotFound => Self::not_found("record not found"),
            other => Self::Database(other),
        }
    }
}
