/**
 * Profile Handlers
 *
 * Self-service endpoints for the authenticated user:
 *
 * - `GET    /users/profile`
 * - `PATCH  /users/profile`
 * - `PATCH  /users/profile/account/update-password`
 * - `POST   /users/profile/account/update-account-type`
 * - `DELETE /users/profile/account/deactivate`
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{
    MessageResponse, UpdatePasswordRequest, UpdateProfileRequest, UpdateTierRequest,
};
use crate::backend::auth::service::IdentityService;
use crate::backend::auth::users::UserProfile;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiJson, AuthUser};

pub async fn get_profile(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.into())
}

pub async fn update_profile(
    State(identity): State<IdentityService>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> BackendResult<Json<UserProfile>> {
    let updated = identity
        .update_profile(&user, request.full_name.as_deref(), request.email.as_deref())
        .await?;
    Ok(Json(updated.into()))
}

pub async fn update_password(
    State(identity): State<IdentityService>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> BackendResult<Json<MessageResponse>> {
    identity
        .change_password(&user, &request.current_password, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}

/// Switch between Basic and Premium
pub async fn update_account_type(
    State(identity): State<IdentityService>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdateTierRequest>,
) -> BackendResult<Json<UserProfile>> {
    let updated = identity.change_own_tier(&user, request.account_tier).await?;
    Ok(Json(updated.into()))
}

pub async fn deactivate_account(
    State(identity): State<IdentityService>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<MessageResponse>> {
    identity.deactivate(user.id).await?;
    Ok(Json(MessageResponse::new("Account deactivated")))
}
