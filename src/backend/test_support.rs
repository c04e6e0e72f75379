//! Fixtures for unit tests
//!
//! Every fixture runs against a fresh in-memory SQLite database, in-memory
//! document storage and the deterministic reply generator.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::service::IdentityService;
use crate::backend::auth::sessions::SessionCodec;
use crate::backend::auth::users::{self, NewUser, User};
use crate::backend::conversations::replies::{ReplyError, ReplyGenerator, StubReplyGenerator};
use crate::backend::conversations::service::ConversationLog;
use crate::backend::documents::db::{self, Document, NewDocument};
use crate::backend::documents::service::DocumentEngine;
use crate::backend::documents::storage::{version_key, DocumentStorage, MemoryStorage};
use crate::backend::server::config::{load_database, ServerConfig, MIN_HASH_COST};
use crate::shared::documents::IngestionStatus;
use crate::shared::AccountTier;

pub const TEST_PASSWORD: &str = "password123";

const TEST_REPLY_TIMEOUT: Duration = Duration::from_millis(250);

pub async fn test_pool() -> SqlitePool {
    load_database(&ServerConfig::for_tests())
        .await
        .expect("failed to open test database")
}

/// Insert an active Basic user whose password is `TEST_PASSWORD`
pub async fn seed_user(pool: &SqlitePool, username: &str) -> User {
    let password_hash = bcrypt::hash(TEST_PASSWORD, MIN_HASH_COST).expect("hash");
    users::create_user(
        pool,
        NewUser {
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            full_name: None,
            password_hash,
        },
    )
    .await
    .expect("failed to seed user")
}

pub async fn seed_user_with_tier(pool: &SqlitePool, username: &str, tier: AccountTier) -> User {
    let user = seed_user(pool, username).await;
    users::set_account_tier(pool, user.id, tier)
        .await
        .expect("failed to set tier")
        .expect("seeded user exists")
}

/// Insert a version-1 document row without touching storage or the tier cap
pub async fn seed_document(pool: &SqlitePool, owner: &User, is_private: bool) -> Document {
    let document_key = Uuid::new_v4().to_string();
    let new_document = NewDocument {
        id: Uuid::new_v4(),
        storage_locator: version_key(&document_key, 1),
        document_key,
        version: 1,
        title: "Seeded document".to_string(),
        user_id: owner.id,
        is_private,
    };
    db::insert_document(pool, &new_document, None)
        .await
        .expect("failed to seed document");
    db::get_by_id(pool, new_document.id)
        .await
        .expect("failed to load seeded document")
        .expect("seeded document exists")
}

/// Reply backend that always fails
pub struct FailingReplyGenerator;

#[async_trait]
impl ReplyGenerator for FailingReplyGenerator {
    async fn generate_reply(&self, _document_id: Option<Uuid>, _prompt: &str) -> Result<String, ReplyError> {
        Err(ReplyError::Backend {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }

    async fn ingestion_status(&self, _document_id: Uuid) -> Result<IngestionStatus, ReplyError> {
        Err(ReplyError::Backend {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }

    async fn cancel_ingestion(&self, _document_id: Uuid) -> Result<(), ReplyError> {
        Err(ReplyError::Backend {
            status: 503,
            message: "backend unavailable".to_string(),
        })
    }
}

/// Reply backend that never answers within the test timeout
pub struct SlowReplyGenerator;

#[async_trait]
impl ReplyGenerator for SlowReplyGenerator {
    async fn generate_reply(&self, document_id: Option<Uuid>, prompt: &str) -> Result<String, ReplyError> {
        tokio::time::sleep(TEST_REPLY_TIMEOUT * 20).await;
        StubReplyGenerator.generate_reply(document_id, prompt).await
    }

    async fn ingestion_status(&self, _document_id: Uuid) -> Result<IngestionStatus, ReplyError> {
        tokio::time::sleep(TEST_REPLY_TIMEOUT * 20).await;
        Ok(IngestionStatus::InProgress)
    }

    async fn cancel_ingestion(&self, _document_id: Uuid) -> Result<(), ReplyError> {
        tokio::time::sleep(TEST_REPLY_TIMEOUT * 20).await;
        Ok(())
    }
}

/// The three services wired over one database
pub struct TestServices {
    pub pool: SqlitePool,
    pub storage: Arc<MemoryStorage>,
    pub identity: IdentityService,
    pub documents: DocumentEngine,
    pub conversations: ConversationLog,
}

impl TestServices {
    pub async fn new() -> Self {
        Self::with_replies(Arc::new(StubReplyGenerator)).await
    }

    pub async fn with_replies(replies: Arc<dyn ReplyGenerator>) -> Self {
        Self::build(test_pool().await, replies)
    }

    /// Services over a WAL database file with the production pool settings
    pub async fn on_disk(path: &Path) -> Self {
        let config = ServerConfig {
            database_url: format!("sqlite://{}", path.display()),
            ..ServerConfig::for_tests()
        };
        let pool = load_database(&config)
            .await
            .expect("failed to open file database");
        Self::build(pool, Arc::new(StubReplyGenerator))
    }

    fn build(pool: SqlitePool, replies: Arc<dyn ReplyGenerator>) -> Self {
        let config = ServerConfig::for_tests();
        let storage = Arc::new(MemoryStorage::new());
        let dyn_storage: Arc<dyn DocumentStorage> = storage.clone();

        let sessions = SessionCodec::from_config(&config).expect("test session codec");
        let identity = IdentityService::new(
            pool.clone(),
            sessions,
            config.password_hash_cost,
            dyn_storage.clone(),
        );
        let documents = DocumentEngine::new(
            pool.clone(),
            dyn_storage,
            replies.clone(),
            config.free_tier_max_documents,
            TEST_REPLY_TIMEOUT,
        );
        let conversations =
            ConversationLog::new(pool.clone(), documents.clone(), replies, TEST_REPLY_TIMEOUT);

        Self {
            pool,
            storage,
            identity,
            documents,
            conversations,
        }
    }
}
