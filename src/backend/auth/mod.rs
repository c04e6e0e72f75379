//! Authentication Module
//!
//! This module handles registration, authentication, session tokens, tier
//! checks and user administration.
//!
//! # Architecture
//!
//! - **`users`** - User row type and database operations
//! - **`sessions`** - Signed bearer tokens (issue / verify)
//! - **`service`** - `IdentityService`, `authorize` and input validation
//! - **`handlers`** - HTTP handlers for user, profile and admin endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - Token management
//! ├── service.rs      - Identity & entitlement service
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens carry user id, username, tier and expiry; expired or tampered
//!   tokens are rejected with 401
//! - Deactivated users are rejected even while their tokens are still valid
//! - Invalid credentials return 401 without revealing whether the user exists

/// User data model and database operations
pub mod users;

/// Token generation and validation
pub mod sessions;

/// Identity and entitlement service
pub mod service;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use service::{authorize, IdentityService};
pub use users::{User, UserProfile};
