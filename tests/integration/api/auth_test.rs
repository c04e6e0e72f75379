//! User and admin API integration tests
//!
//! Registration, login, profile management, self-service tier changes and
//! the moderator endpoints.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use docqa::backend::auth::handlers::types::TokenResponse;
use docqa::backend::auth::UserProfile;
use docqa::shared::AccountTier;

use crate::common::*;

#[tokio::test]
async fn test_register_returns_bearer_token() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/users/auth/register")
        .json(&json!({
            "username": "alice",
            "password": TEST_PASSWORD,
            "full_name": "Alice Liddell"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let token: TokenResponse = response.json();
    assert_eq!(token.token_type, "bearer");
    assert!(!token.access_token.is_empty());

    let profile: UserProfile = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&token.access_token)
        .await
        .json();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.full_name.as_deref(), Some("Alice Liddell"));
    assert_eq!(profile.account_tier, AccountTier::Basic);
    assert!(profile.is_active);
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    register_user(&app, "alice").await;

    let response = app
        .server
        .post("/api/v1/users/auth/register")
        .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
        .await;

    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[tokio::test]
async fn test_register_rejects_invalid_username() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/users/auth/register")
        .json(&json!({ "username": "a b", "password": TEST_PASSWORD }))
        .await;

    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_input");
}

#[tokio::test]
async fn test_login_by_username_and_email() {
    let app = TestApp::new().await;
    register_user(&app, "alice").await;

    for login in ["alice", "alice@example.com"] {
        let response = app
            .server
            .post("/api/v1/users/auth/login")
            .json(&json!({ "username": login, "password": TEST_PASSWORD }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let token: TokenResponse = response.json();
        assert_eq!(token.token_type, "bearer");
    }
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    register_user(&app, "alice").await;

    let response = app
        .server
        .post("/api/v1/users/auth/login")
        .json(&json!({ "username": "alice", "password": "not-the-password" }))
        .await;

    assert_error(&response, StatusCode::UNAUTHORIZED, "invalid_credentials");
}

#[tokio::test]
async fn test_token_endpoint_accepts_password_form() {
    let app = TestApp::new().await;
    register_user(&app, "alice").await;

    let response = app
        .server
        .post("/api/v1/users/auth/token")
        .form(&[
            ("grant_type", "password"),
            ("username", "alice"),
            ("password", TEST_PASSWORD),
            ("scope", ""),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let token: TokenResponse = response.json();
    assert_eq!(token.token_type, "bearer");

    let profile: UserProfile = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&token.access_token)
        .await
        .json();
    assert_eq!(profile.username, "alice");
}

#[tokio::test]
async fn test_token_endpoint_wrong_password() {
    let app = TestApp::new().await;
    register_user(&app, "alice").await;

    let response = app
        .server
        .post("/api/v1/users/auth/token")
        .form(&[("username", "alice"), ("password", "not-the-password")])
        .await;

    assert_error(&response, StatusCode::UNAUTHORIZED, "invalid_credentials");
}

#[tokio::test]
async fn test_login_missing_field_is_unprocessable() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/v1/users/auth/login")
        .json(&json!({ "username": "alice" }))
        .await;

    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_input");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = TestApp::new().await;

    let missing = app.server.get("/api/v1/users/profile").await;
    assert_error(&missing, StatusCode::UNAUTHORIZED, "invalid_auth_token");

    let garbage = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer("not.a.token")
        .await;
    assert_error(&garbage, StatusCode::UNAUTHORIZED, "invalid_auth_token");
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let response = app
        .server
        .patch("/api/v1/users/profile")
        .authorization_bearer(&alice.token)
        .json(&json!({ "full_name": "Alice L.", "email": "alice@wonderland.example" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let profile: UserProfile = response.json();
    assert_eq!(profile.full_name.as_deref(), Some("Alice L."));
    assert_eq!(profile.email.as_deref(), Some("alice@wonderland.example"));
}

#[tokio::test]
async fn test_update_profile_email_taken() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    register_user(&app, "bob").await;

    let response = app
        .server
        .patch("/api/v1/users/profile")
        .authorization_bearer(&alice.token)
        .json(&json!({ "email": "bob@example.com" }))
        .await;

    assert_error(&response, StatusCode::CONFLICT, "conflict");
}

#[tokio::test]
async fn test_change_password_then_login() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let wrong = app
        .server
        .patch("/api/v1/users/profile/account/update-password")
        .authorization_bearer(&alice.token)
        .json(&json!({ "current_password": "nope-nope", "new_password": "fresh-secret" }))
        .await;
    assert_error(&wrong, StatusCode::UNAUTHORIZED, "invalid_credentials");

    let changed = app
        .server
        .patch("/api/v1/users/profile/account/update-password")
        .authorization_bearer(&alice.token)
        .json(&json!({ "current_password": TEST_PASSWORD, "new_password": "fresh-secret" }))
        .await;
    assert_eq!(changed.status_code(), StatusCode::OK);

    let old = app
        .server
        .post("/api/v1/users/auth/login")
        .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
        .await;
    assert_error(&old, StatusCode::UNAUTHORIZED, "invalid_credentials");

    let new = app
        .server
        .post("/api/v1/users/auth/login")
        .json(&json!({ "username": "alice", "password": "fresh-secret" }))
        .await;
    assert_eq!(new.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_self_service_tier_change() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let upgraded = app
        .server
        .post("/api/v1/users/profile/account/update-account-type")
        .authorization_bearer(&alice.token)
        .json(&json!({ "account_tier": "PREMIUM" }))
        .await;
    assert_eq!(upgraded.status_code(), StatusCode::OK);
    let profile: UserProfile = upgraded.json();
    assert_eq!(profile.account_tier, AccountTier::Premium);

    let moderator = app
        .server
        .post("/api/v1/users/profile/account/update-account-type")
        .authorization_bearer(&alice.token)
        .json(&json!({ "account_tier": "MODERATOR" }))
        .await;
    assert_error(&moderator, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_deactivated_account_is_locked_out() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let response = app
        .server
        .delete("/api/v1/users/profile/account/deactivate")
        .authorization_bearer(&alice.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let reuse = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&alice.token)
        .await;
    assert_error(&reuse, StatusCode::FORBIDDEN, "account_deactivated");

    let login = app
        .server
        .post("/api/v1/users/auth/login")
        .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
        .await;
    assert_error(&login, StatusCode::FORBIDDEN, "account_deactivated");
}

#[tokio::test]
async fn test_admin_routes_require_moderator() {
    let app = TestApp::new().await;
    let premium = register_with_tier(&app, "paula", AccountTier::Premium).await;

    let response = app
        .server
        .get("/api/v1/admin/users")
        .authorization_bearer(&premium.token)
        .await;

    assert_error(&response, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_moderator_manages_users() {
    let app = TestApp::new().await;
    let moderator = register_with_tier(&app, "mod", AccountTier::Moderator).await;
    let bob = register_user(&app, "bob").await;

    let users: Vec<UserProfile> = app
        .server
        .get("/api/v1/admin/users")
        .authorization_bearer(&moderator.token)
        .await
        .json();
    assert_eq!(users.len(), 2);

    let found: UserProfile = app
        .server
        .get("/api/v1/admin/user/bob")
        .authorization_bearer(&moderator.token)
        .await
        .json();
    assert_eq!(found.id, bob.id);

    let granted: UserProfile = app
        .server
        .post(&format!("/api/v1/admin/tier/{}", bob.id))
        .authorization_bearer(&moderator.token)
        .json(&json!({ "account_tier": "MODERATOR" }))
        .await
        .json();
    assert_eq!(granted.account_tier, AccountTier::Moderator);

    let deactivated = app
        .server
        .delete(&format!("/api/v1/admin/deactivate/{}", bob.id))
        .authorization_bearer(&moderator.token)
        .await;
    assert_eq!(deactivated.status_code(), StatusCode::OK);
    let locked = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&bob.token)
        .await;
    assert_error(&locked, StatusCode::FORBIDDEN, "account_deactivated");

    let activated = app
        .server
        .post(&format!("/api/v1/admin/activate/{}", bob.id))
        .authorization_bearer(&moderator.token)
        .await;
    assert_eq!(activated.status_code(), StatusCode::OK);
    let unlocked = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&bob.token)
        .await;
    assert_eq!(unlocked.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_moderator_deletes_user_and_stored_documents() {
    let app = TestApp::new().await;
    let moderator = register_with_tier(&app, "mod", AccountTier::Moderator).await;
    let bob = register_user(&app, "bob").await;
    upload_document(&app, &bob, "Bob's notes", false).await;
    assert_eq!(app.storage.len().await, 1);

    let response = app
        .server
        .delete(&format!("/api/v1/admin/delete/{}", bob.id))
        .authorization_bearer(&moderator.token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert!(app.storage.is_empty().await);
    let gone = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&bob.token)
        .await;
    assert_error(&gone, StatusCode::UNAUTHORIZED, "invalid_auth_token");

    let missing = app
        .server
        .delete(&format!("/api/v1/admin/delete/{}", bob.id))
        .authorization_bearer(&moderator.token)
        .await;
    assert_error(&missing, StatusCode::NOT_FOUND, "not_found");
}
