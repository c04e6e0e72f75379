/**
 * Login Handler
 *
 * POST /api/v1/users/auth/login  (JSON body)
 * POST /api/v1/users/auth/token  (OAuth2 password form: username, password)
 *
 * Unknown usernames and wrong passwords both answer 401 so the response does
 * not reveal which accounts exist. Deactivated accounts answer 403.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{LoginRequest, TokenResponse};
use crate::backend::auth::service::IdentityService;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiForm, ApiJson};

pub async fn login(
    State(identity): State<IdentityService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> BackendResult<Json<TokenResponse>> {
    sign_in(&identity, request).await
}

/// Form-encoded login for OAuth2 password-flow clients; extra form fields
/// such as `grant_type` and `scope` are ignored
pub async fn token(
    State(identity): State<IdentityService>,
    ApiForm(request): ApiForm<LoginRequest>,
) -> BackendResult<Json<TokenResponse>> {
    sign_in(&identity, request).await
}

async fn sign_in(identity: &IdentityService, request: LoginRequest) -> BackendResult<Json<TokenResponse>> {
    tracing::info!("Login request for: {}", request.username);

    let user = identity.authenticate(&request.username, &request.password).await?;
    let token = identity.issue_session(&user)?;

    tracing::info!("User logged in: {}", user.username);
    Ok(Json(TokenResponse::bearer(token)))
}
