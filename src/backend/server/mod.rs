//! Server Module
//!
//! This module contains server initialization, application state and
//! configuration loading.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs      - Module exports and documentation
//! ├── config.rs   - ServerConfig, ConfigError, database pool
//! ├── state.rs    - AppState and FromRef implementations
//! └── init.rs     - Service wiring and router creation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use docqa::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(config).await?;
//! // Serve with axum::serve
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use init::{build_state, create_app, InitError};
pub use state::AppState;
