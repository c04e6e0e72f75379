/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including database loading, collaborator selection and route configuration.
 *
 * # Initialization Process
 *
 * 1. Open the SQLite pool and apply migrations
 * 2. Choose the storage adapter (local filesystem under `storage_path`)
 * 3. Choose the reply generator (HTTP when `reply_backend_url` is set,
 *    the deterministic stub otherwise)
 * 4. Wire the services into `AppState` and build the router
 */

use std::sync::Arc;

use axum::Router;
use thiserror::Error;

use crate::backend::conversations::replies::{HttpReplyGenerator, ReplyGenerator, StubReplyGenerator};
use crate::backend::documents::storage::{DocumentStorage, LocalStorage};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ConfigError, ServerConfig};
use crate::backend::server::state::AppState;

/// Startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open database: {0}")]
    Database(#[from] sqlx::Error),
}

/// Build the application state from configuration
///
/// # Errors
/// `InitError` if the database cannot be opened or migrated, or if the
/// token settings are invalid
pub async fn build_state(config: ServerConfig) -> Result<AppState, InitError> {
    let db_pool = load_database(&config).await?;

    let storage: Arc<dyn DocumentStorage> = Arc::new(LocalStorage::new(&config.storage_path));
    tracing::info!("Storing documents under {}", config.storage_path.display());

    let replies: Arc<dyn ReplyGenerator> = match &config.reply_backend_url {
        Some(url) => {
            tracing::info!("Using reply backend at {}", url);
            Arc::new(HttpReplyGenerator::new(url.clone()))
        }
        None => {
            tracing::warn!("REPLY_BACKEND_URL not set, using the stub reply generator");
            Arc::new(StubReplyGenerator)
        }
    };

    Ok(AppState::new(config, db_pool, storage, replies)?)
}

/// Create the application router
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, InitError> {
    tracing::info!("Initializing docqa backend server");

    let app_state = build_state(config).await?;
    let app = create_router(app_state);

    tracing::info!("Router configured");
    Ok(app)
}
