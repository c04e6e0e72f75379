//! Authentication Handlers Module
//!
//! HTTP handlers for the user, profile and admin endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Request and response types
//! ├── register.rs   - User registration handler
//! ├── login.rs      - User authentication handler
//! ├── profile.rs    - Self-service profile and account handlers
//! └── admin.rs      - Moderator user management
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: username + password → Basic user created → bearer token returned
//! 2. **Login**: username (or email) + password → credentials verified → bearer token returned
//!    (JSON at `/users/auth/login`, form-encoded at `/users/auth/token`)
//! 3. **Profile**: bearer token → `AuthUser` extractor → current user returned

/// Request and response types
pub mod types;

pub mod register;

pub mod login;

pub mod profile;

pub mod admin;

pub use login::{login, token};
pub use register::register;
pub use types::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse};
