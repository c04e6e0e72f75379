/**
 * API Route Configuration
 *
 * Routes are relative to the `/api/v1` prefix applied by `create_router`.
 *
 * # Routes
 *
 * ## Users
 * - `POST   /users/auth/register`, `POST /users/auth/login`, `POST /users/auth/token`
 * - `GET|PATCH /users/profile`
 * - `PATCH  /users/profile/account/update-password`
 * - `POST   /users/profile/account/update-account-type`
 * - `DELETE /users/profile/account/deactivate`
 *
 * ## Admin (Moderator)
 * - `GET /admin/users`, `GET /admin/user/{username}`
 * - `POST /admin/activate/{user_id}`, `DELETE /admin/deactivate/{user_id}`
 * - `POST /admin/tier/{user_id}`, `DELETE /admin/delete/{user_id}`
 *
 * ## Documents
 * - `GET|POST|PATCH /documents`, `GET /documents/stats`
 * - `GET|POST|DELETE /documents/stars/{document_id}`
 * - `GET|DELETE /documents/{document_key}`
 * - `GET /documents/public/user/{username}`
 * - `GET /documents/public/explore[/trending|/latest]`
 *
 * ## Ingestion
 * - `GET /llm/ingestion_status/{document_id}`
 * - `DELETE /llm/cancel_ingestion/{document_id}`
 *
 * ## Conversations
 * - `GET|POST /conversations`
 * - `GET|POST|DELETE /conversations/{conversation_id}`
 * - `POST /conversations/{conversation_id}/archive`
 */

use axum::routing::{delete, get, post};
use axum::Router;

use crate::backend::auth::handlers::{admin, login, profile, register, token};
use crate::backend::conversations::handlers as conversations;
use crate::backend::documents::handlers as documents;
use crate::backend::server::state::AppState;

pub fn configure_user_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/users/auth/register", post(register))
        .route("/users/auth/login", post(login))
        .route("/users/auth/token", post(token))
        .route(
            "/users/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route(
            "/users/profile/account/update-password",
            axum::routing::patch(profile::update_password),
        )
        .route(
            "/users/profile/account/update-account-type",
            post(profile::update_account_type),
        )
        .route(
            "/users/profile/account/deactivate",
            delete(profile::deactivate_account),
        )
}

pub fn configure_admin_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/admin/users", get(admin::list_users))
        .route("/admin/user/{username}", get(admin::get_user))
        .route("/admin/activate/{user_id}", post(admin::activate_user))
        .route("/admin/deactivate/{user_id}", delete(admin::deactivate_user))
        .route("/admin/tier/{user_id}", post(admin::set_user_tier))
        .route("/admin/delete/{user_id}", delete(admin::delete_user))
}

pub fn configure_document_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/documents",
            get(documents::list_owned)
                .post(documents::upload)
                .patch(documents::reupload),
        )
        .route("/documents/stats", get(documents::stats))
        .route(
            "/documents/stars/{document_id}",
            get(documents::star_status)
                .post(documents::star)
                .delete(documents::unstar),
        )
        .route(
            "/documents/{document_key}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route(
            "/documents/public/user/{username}",
            get(documents::list_user_documents),
        )
        .route("/documents/public/explore", get(documents::explore))
        .route("/documents/public/explore/trending", get(documents::trending))
        .route("/documents/public/explore/latest", get(documents::latest))
        .route(
            "/llm/ingestion_status/{document_id}",
            get(documents::ingestion_status),
        )
        .route(
            "/llm/cancel_ingestion/{document_id}",
            delete(documents::cancel_ingestion),
        )
}

pub fn configure_conversation_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::start_conversation),
        )
        .route(
            "/conversations/{conversation_id}",
            get(conversations::get_conversation)
                .post(conversations::post_message)
                .delete(conversations::delete_conversation),
        )
        .route(
            "/conversations/{conversation_id}/archive",
            post(conversations::archive_conversation),
        )
}

/// All versioned API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    let router = configure_user_routes(router);
    let router = configure_admin_routes(router);
    let router = configure_document_routes(router);
    configure_conversation_routes(router)
}
