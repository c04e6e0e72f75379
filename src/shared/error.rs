//! Shared Error Types
//!
//! Errors produced while validating or parsing the types in `shared`. The
//! backend wraps these in `BackendError::Shared`, which reports them to
//! clients as unprocessable input.
//!
//! # Error Categories
//!
//! - `ValidationError` - a request field failed validation
//! - `UnknownVariant` - a stored or submitted tag does not name a known variant
//!
//! # Usage
//!
//! ```rust
//! use docqa::shared::error::SharedError;
//!
//! let error = SharedError::validation("username", "must be 3-30 characters");
//! ```
use thiserror::Error;

/// Errors raised by shared validation and parsing helpers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A string tag did not match any variant of the named enum
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant {
        /// Name of the enum being parsed
        kind: &'static str,
        /// The rejected input
        value: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-variant error
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}
