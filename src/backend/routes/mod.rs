//! Routes Module
//!
//! Route configuration and router assembly.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - create_router: health, /api/v1 nest, layers
//! └── api_routes.rs   - configure_*_routes per resource
//! ```

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
