/**
 * Authentication Extractors
 *
 * Protected handlers take `AuthUser`, which reads the bearer token from the
 * Authorization header, verifies it and loads the current user row. Routes
 * open to anonymous callers take `MaybeAuthUser` instead.
 *
 * Tokens stay cryptographically valid after deactivation, so the stored
 * active flag is checked on every request.
 */

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// The authenticated, active caller
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// The caller if a bearer token was sent
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// # Returns
/// `Ok(None)` when the header is absent
fn bearer_token(parts: &Parts) -> Result<Option<&str>, BackendError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| BackendError::invalid_token("Authorization header is not valid text"))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            BackendError::invalid_token("expected a bearer token")
        })?;
    Ok(Some(token.trim()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            BackendError::invalid_token("missing bearer token")
        })?;
        let user = state.identity.resolve_session(token).await?;
        Ok(AuthUser(user))
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(state.identity.resolve_session(token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
