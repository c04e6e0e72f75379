//! Conversations Module
//!
//! Per-user threads of messages about a document, with an external reply
//! generator producing the assistant side.
//!
//! # Module Structure
//!
//! ```text
//! conversations/
//! ├── mod.rs        - Module exports and documentation
//! ├── db.rs         - Conversation and message queries
//! ├── replies.rs    - ReplyGenerator trait, stub and HTTP implementations
//! ├── service.rs    - ConversationLog
//! └── handlers.rs   - HTTP handlers
//! ```

pub mod db;
pub mod handlers;
pub mod replies;
pub mod service;

pub use replies::{HttpReplyGenerator, ReplyError, ReplyGenerator, StubReplyGenerator};
pub use service::ConversationLog;
