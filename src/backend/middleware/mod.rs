//! Middleware Module
//!
//! This module contains the request-processing pieces that sit in front of
//! the handlers.
//!
//! # Architecture
//!
//! - **`auth`** - `AuthUser` / `MaybeAuthUser` extractors resolving bearer tokens
//! - **`access_log`** - Per-request access log under the `access` target
//! - **`extract`** - `Json`/`Form`/`Path`/`Query` wrappers rejecting with `BackendError`
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, Router};
//! use docqa::backend::middleware::access_log;
//!
//! let router: Router = Router::new().layer(middleware::from_fn(access_log));
//! ```

pub mod access_log;
pub mod auth;
pub mod extract;

pub use access_log::access_log;
pub use auth::{AuthUser, MaybeAuthUser};
pub use extract::{ApiForm, ApiJson, ApiPath, ApiQuery};
