/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container. It holds:
 * - The SQLite pool (single source of truth for all mutable state)
 * - The loaded configuration
 * - The identity, document and conversation services
 *
 * No in-process mutable state is kept; every service is a cheap clone
 * around the pool and `Arc`-held collaborators (storage, reply generator).
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only the service they
 * need, e.g. `State(documents): State<DocumentEngine>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::service::IdentityService;
use crate::backend::auth::sessions::SessionCodec;
use crate::backend::conversations::replies::ReplyGenerator;
use crate::backend::conversations::service::ConversationLog;
use crate::backend::documents::service::DocumentEngine;
use crate::backend::documents::storage::DocumentStorage;
use crate::backend::server::config::{ConfigError, ServerConfig};

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<ServerConfig>,
    pub identity: IdentityService,
    pub documents: DocumentEngine,
    pub conversations: ConversationLog,
}

impl AppState {
    /// Wire the services over one pool and the injected collaborators
    ///
    /// # Errors
    /// `ConfigError` if the token settings are invalid
    pub fn new(
        config: ServerConfig,
        db_pool: SqlitePool,
        storage: Arc<dyn DocumentStorage>,
        replies: Arc<dyn ReplyGenerator>,
    ) -> Result<Self, ConfigError> {
        let sessions = SessionCodec::from_config(&config)?;
        let identity = IdentityService::new(
            db_pool.clone(),
            sessions,
            config.password_hash_cost,
            storage.clone(),
        );
        let documents = DocumentEngine::new(
            db_pool.clone(),
            storage,
            replies.clone(),
            config.free_tier_max_documents,
            config.reply_timeout(),
        );
        let conversations = ConversationLog::new(
            db_pool.clone(),
            documents.clone(),
            replies,
            config.reply_timeout(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            identity,
            documents,
            conversations,
        })
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for IdentityService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for DocumentEngine {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.documents.clone()
    }
}

impl FromRef<AppState> for ConversationLog {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.conversations.clone()
    }
}
