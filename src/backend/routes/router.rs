/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Layout
 *
 * 1. `GET /` health check
 * 2. API routes nested under `/api/v1`
 * 3. JSON 404 fallback
 *
 * # Layers
 *
 * - Request body limit (25 MiB, covers multipart uploads)
 * - CORS from the configured allow-list (permissive when empty)
 * - Access log
 */

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::backend::error::BackendError;
use crate::backend::middleware::access_log;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(app_state: AppState) -> Router<()> {
    let cors = cors_layer(&app_state.config.cors_allowed_origins);

    let api = configure_api_routes(Router::new());

    Router::new()
        .route("/", get(health))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(middleware::from_fn(access_log))
        .with_state(app_state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> BackendError {
    BackendError::not_found("No such route")
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
