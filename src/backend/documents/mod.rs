//! Documents Module
//!
//! Versioned document lineages, visibility, counters, stars and ingestion
//! status.
//!
//! # Module Structure
//!
//! ```text
//! documents/
//! ├── mod.rs        - Module exports and documentation
//! ├── db.rs         - Document rows and queries
//! ├── stars.rs      - Star ledger (batched counts and membership)
//! ├── storage.rs    - DocumentStorage trait: local, memory, object placeholder
//! ├── service.rs    - DocumentEngine (upload, re-upload, delete, listings)
//! ├── ingestion.rs  - Ingestion status and cancellation
//! └── handlers.rs   - HTTP handlers
//! ```
//!
//! # Versioning
//!
//! A lineage is every row sharing one `document_key`. Exactly one row per
//! lineage is active; re-uploads insert `version + 1` and deactivate the
//! previous row in one transaction.

pub mod db;
pub mod handlers;
pub mod ingestion;
pub mod service;
pub mod stars;
pub mod storage;

pub use db::Document;
pub use service::{DocumentEngine, ReuploadDocument, UploadDocument};
pub use storage::{DocumentStorage, LocalStorage, MemoryStorage, ObjectStorage};
