//! Shared Module
//!
//! Types shared by every layer of the service: the account tier order,
//! pagination, and the request/response shapes of the HTTP API. Nothing in
//! here touches the database or the network.
//!
//! # Overview
//!
//! - **`tier`** - `AccountTier`, the total order Basic < Premium < Moderator
//! - **`pagination`** - `Page`, a clamped page number with a fixed page size
//! - **`documents`** - document, star and ingestion wire types
//! - **`messaging`** - conversation and message wire types
//! - **`error`** - validation errors

/// Shared error types
pub mod error;

/// Account tiers and entitlement limits
pub mod tier;

/// Pagination helpers
pub mod pagination;

/// Document wire types
pub mod documents;

/// Conversation and message wire types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use pagination::Page;
pub use tier::AccountTier;
