//! docqa - Document Q&A Service
//!
//! docqa stores user-uploaded documents as versioned lineages, controls who
//! may see them, and lets users hold conversations about a document with an
//! external reply generator answering on the assistant side.
//!
//! # Overview
//!
//! - Three account tiers (Basic < Premium < Moderator) gate uploads, version
//!   history and administration
//! - Every re-upload creates a new version; exactly one version per lineage
//!   is active at any time
//! - Public documents can be explored by views, stars or recency
//! - Conversations append a user message and the generated assistant reply
//!   as one unit
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every layer (tiers, pagination, wire types)
//! - **`backend`** - Axum server, services, persistence
//!
//! # Usage
//!
//! ```rust,no_run
//! use docqa::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::load()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::SharedError` for validation of shared types
//! - `backend::BackendError` for everything the HTTP surface can report;
//!   each variant maps to a stable status code and machine-readable kind

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
