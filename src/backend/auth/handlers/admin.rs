/**
 * Admin Handlers
 *
 * Moderator-only user management. The tier check happens in
 * `IdentityService`, so every handler here answers 403 for lower tiers.
 */

use axum::{
    extract::State,
    response::Json,
};
use uuid::Uuid;

use crate::backend::auth::handlers::types::{MessageResponse, UpdateTierRequest};
use crate::backend::auth::service::IdentityService;
use crate::backend::auth::users::UserProfile;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::shared::pagination::PageQuery;

/// GET /admin/users?page=
pub async fn list_users(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> BackendResult<Json<Vec<UserProfile>>> {
    let users = identity.list_users(&actor, query.page()).await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// GET /admin/user/{username}
pub async fn get_user(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiPath(username): ApiPath<String>,
) -> BackendResult<Json<UserProfile>> {
    let user = identity.find_user(&actor, &username).await?;
    Ok(Json(user.into()))
}

/// POST /admin/activate/{user_id}
pub async fn activate_user(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    identity.moderate_activation(&actor, user_id, true).await?;
    Ok(Json(MessageResponse::new("User activated")))
}

/// DELETE /admin/deactivate/{user_id}
pub async fn deactivate_user(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    identity.moderate_activation(&actor, user_id, false).await?;
    Ok(Json(MessageResponse::new("User deactivated")))
}

/// POST /admin/tier/{user_id}
pub async fn set_user_tier(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateTierRequest>,
) -> BackendResult<Json<UserProfile>> {
    let user = identity.grant_tier(&actor, user_id, request.account_tier).await?;
    Ok(Json(user.into()))
}

/// DELETE /admin/delete/{user_id}
pub async fn delete_user(
    State(identity): State<IdentityService>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    identity.delete_user(&actor, user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
