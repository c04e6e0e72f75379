/**
 * Register Handler
 *
 * POST /api/v1/users/auth/register
 *
 * # Registration Process
 *
 * 1. Validate username, email and password
 * 2. Reject taken usernames and emails (distinct messages)
 * 3. Hash the password and create a Basic user
 * 4. Return a bearer token for immediate authentication
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{RegisterRequest, TokenResponse};
use crate::backend::auth::service::{IdentityService, RegisterUser};
use crate::backend::error::BackendResult;
use crate::backend::middleware::ApiJson;

/// Register handler
///
/// # Errors
///
/// * `422 Unprocessable Entity` - invalid username, email or password
/// * `409 Conflict` - username or email already taken
///
/// # Example Request
///
/// ```http
/// POST /api/v1/users/auth/register HTTP/1.1
/// Content-Type: application/json
///
/// {"username": "alice", "email": "alice@example.com", "password": "securepassword123"}
/// ```
pub async fn register(
    State(identity): State<IdentityService>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> BackendResult<(StatusCode, Json<TokenResponse>)> {
    tracing::info!("Register request for username: {}", request.username);

    let user = identity
        .register(RegisterUser {
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            password: request.password,
        })
        .await?;
    let token = identity.issue_session(&user)?;

    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}
