//! Backend Module
//!
//! All server-side code: the Axum HTTP server, the identity, document and
//! conversation services, and their persistence.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`auth`** - Identity & entitlement: users, tokens, tiers, admin
//! - **`documents`** - Versioned documents, stars, storage, ingestion status
//! - **`conversations`** - Conversation log and reply generation
//! - **`middleware`** - Auth extractors and access log
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Config, state, init
//! ├── routes/         - Route configuration
//! ├── auth/           - Identity & entitlement
//! ├── documents/      - Document engine
//! ├── conversations/  - Conversation log
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Request Flow
//!
//! An authenticated request resolves to a `User` through the `AuthUser`
//! extractor, the service enforces tier and ownership rules, and the
//! database (SQLite through sqlx) arbitrates every concurrent mutation.
//! There is no in-process mutable state.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// Document versioning, visibility and stars
pub mod documents;

/// Conversations and reply generation
pub mod conversations;

/// Middleware for request processing
pub mod middleware;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BackendError, BackendResult};
pub use server::create_app;
