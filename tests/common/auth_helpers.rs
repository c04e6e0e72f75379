//! Authentication test helpers
//!
//! Accounts are created through the register endpoint so every test user
//! carries a real bearer token. Tiers above Premium cannot be self-granted,
//! so `promote` writes the tier directly.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use docqa::backend::auth::users::set_account_tier;
use docqa::shared::AccountTier;

use super::database::TestApp;

pub const TEST_PASSWORD: &str = "password123";

/// Test user credentials
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Register a user and return its token and id
pub async fn register_user(app: &TestApp, username: &str) -> TestUser {
    let response = app
        .server
        .post("/api/v1/users/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let token = body["access_token"]
        .as_str()
        .expect("register response carries a token")
        .to_string();

    let profile: serde_json::Value = app
        .server
        .get("/api/v1/users/profile")
        .authorization_bearer(&token)
        .await
        .json();
    let id = profile["id"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("profile carries the user id");

    TestUser {
        id,
        username: username.to_string(),
        token,
    }
}

/// Register a user and move it to `tier`
pub async fn register_with_tier(app: &TestApp, username: &str, tier: AccountTier) -> TestUser {
    let user = register_user(app, username).await;
    if tier != AccountTier::Basic {
        promote(app, &user, tier).await;
    }
    user
}

/// Set a user's tier without going through the API
pub async fn promote(app: &TestApp, user: &TestUser, tier: AccountTier) {
    set_account_tier(&app.pool, user.id, tier)
        .await
        .expect("Failed to set account tier")
        .expect("user exists");
}
