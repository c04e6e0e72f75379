//! Document API integration tests
//!
//! Upload limits, versioned re-uploads, visibility, deletion, stars, the
//! public listings and ingestion status.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use docqa::shared::documents::{
    DocumentResponse, DocumentStats, IngestionStatus, IngestionStatusResponse, StarStatus,
};
use docqa::shared::messaging::ConversationResponse;
use docqa::shared::AccountTier;

use crate::common::*;

async fn get_document(app: &TestApp, viewer: Option<&TestUser>, key: &str) -> axum_test::TestResponse {
    let request = app.server.get(&format!("/api/v1/documents/{key}"));
    match viewer {
        Some(user) => request.authorization_bearer(&user.token).await,
        None => request.await,
    }
}

async fn start_conversation(app: &TestApp, user: &TestUser, document: &DocumentResponse) -> ConversationResponse {
    let response = app
        .server
        .post("/api/v1/conversations")
        .authorization_bearer(&user.token)
        .json(&json!({ "document_id": document.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new().await;

    let health = app.server.get("/").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<serde_json::Value>(), json!({ "status": "ok" }));

    let missing = app.server.get("/api/v1/nowhere").await;
    assert_error(&missing, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_upload_creates_first_version() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let document = upload_document(&app, &alice, "Quarterly report", false).await;

    assert_eq!(document.version, 1);
    assert_eq!(document.title, "Quarterly report");
    assert_eq!(document.owner_username, "alice");
    assert_eq!(document.views, 0);
    assert_eq!(document.total_stars, 0);
    assert_eq!(document.ingestion_status, IngestionStatus::Pending);
    assert_eq!(app.storage.len().await, 1);
}

#[tokio::test]
async fn test_upload_requires_title() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let response = try_upload(&app, &alice, "   ", false).await;

    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_input");
    assert!(app.storage.is_empty().await);
}

#[tokio::test]
async fn test_free_tier_cap_then_upgrade() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    for n in 0..3 {
        upload_document(&app, &alice, &format!("Doc {n}"), false).await;
    }
    let rejected = try_upload(&app, &alice, "Doc 3", false).await;
    assert_error(&rejected, StatusCode::FORBIDDEN, "tier_limit_exceeded");
    assert_eq!(app.storage.len().await, 3);

    app.server
        .post("/api/v1/users/profile/account/update-account-type")
        .authorization_bearer(&alice.token)
        .json(&json!({ "account_tier": "PREMIUM" }))
        .await
        .assert_status_ok();

    upload_document(&app, &alice, "Doc 3", false).await;
    let owned: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents")
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(owned.len(), 4);
}

#[tokio::test]
async fn test_reupload_requires_premium() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let document = upload_document(&app, &alice, "Draft", false).await;

    let response = try_reupload(&app, &alice, &document.document_key).await;

    assert_error(&response, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_reupload_supersedes_and_detaches_conversations() {
    let app = TestApp::new().await;
    let alice = register_with_tier(&app, "alice", AccountTier::Premium).await;
    let document = upload_document(&app, &alice, "Draft", true).await;
    let conversation = start_conversation(&app, &alice, &document).await;
    assert_eq!(conversation.document_id, Some(document.id));

    let response = try_reupload(&app, &alice, &document.document_key).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let revised: DocumentResponse = response.json();

    assert_eq!(revised.document_key, document.document_key);
    assert_eq!(revised.version, 2);
    assert_ne!(revised.id, document.id);
    assert_eq!(revised.title, "Draft");
    assert!(revised.is_private);

    let active: DocumentResponse = get_document(&app, Some(&alice), &document.document_key)
        .await
        .json();
    assert_eq!(active.id, revised.id);

    let conversations: Vec<ConversationResponse> = app
        .server
        .get("/api/v1/conversations")
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].document_id, None);

    let stats: DocumentStats = app
        .server
        .get("/api/v1/documents/stats")
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.total_revisions, 1);
    assert_eq!(stats.private_documents, 1);
    assert_eq!(app.storage.len().await, 2);
}

#[tokio::test]
async fn test_reupload_by_non_owner_is_forbidden() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let mallory = register_with_tier(&app, "mallory", AccountTier::Premium).await;
    let document = upload_document(&app, &alice, "Alice's file", false).await;

    let response = try_reupload(&app, &mallory, &document.document_key).await;

    assert_error(&response, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_reupload_unknown_key() {
    let app = TestApp::new().await;
    let alice = register_with_tier(&app, "alice", AccountTier::Premium).await;

    let response = try_reupload(&app, &alice, "no-such-key").await;

    assert_error(&response, StatusCode::NOT_FOUND, "document_missing");
}

#[tokio::test]
async fn test_private_document_visibility() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let document = upload_document(&app, &alice, "Diary", true).await;

    let owner = get_document(&app, Some(&alice), &document.document_key).await;
    assert_eq!(owner.status_code(), StatusCode::OK);

    let other = get_document(&app, Some(&bob), &document.document_key).await;
    assert_error(&other, StatusCode::FORBIDDEN, "forbidden");

    let anonymous = get_document(&app, None, &document.document_key).await;
    assert_error(&anonymous, StatusCode::FORBIDDEN, "forbidden");

    let explore: Vec<DocumentResponse> = app.server.get("/api/v1/documents/public/explore").await.json();
    assert!(explore.is_empty());

    let as_owner: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents/public/user/alice")
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(as_owner.len(), 1);

    let as_other: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents/public/user/alice")
        .authorization_bearer(&bob.token)
        .await
        .json();
    assert!(as_other.is_empty());
}

#[tokio::test]
async fn test_public_document_is_readable_anonymously() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let document = upload_document(&app, &alice, "Handbook", false).await;

    let response = get_document(&app, None, &document.document_key).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let fetched: DocumentResponse = response.json();
    assert_eq!(fetched.id, document.id);
    assert!(!fetched.user_starred);
}

#[tokio::test]
async fn test_unknown_document_key() {
    let app = TestApp::new().await;

    let response = get_document(&app, None, "missing").await;

    assert_error(&response, StatusCode::NOT_FOUND, "document_missing");
}

#[tokio::test]
async fn test_delete_document() {
    let app = TestApp::new().await;
    let alice = register_with_tier(&app, "alice", AccountTier::Premium).await;
    let bob = register_user(&app, "bob").await;
    let document = upload_document(&app, &alice, "Obsolete", false).await;
    let revised: DocumentResponse = try_reupload(&app, &alice, &document.document_key)
        .await
        .json();
    let conversation = start_conversation(&app, &bob, &revised).await;

    let denied = app
        .server
        .delete(&format!("/api/v1/documents/{}", document.document_key))
        .authorization_bearer(&bob.token)
        .await;
    assert_error(&denied, StatusCode::FORBIDDEN, "forbidden");

    app.server
        .delete(&format!("/api/v1/documents/{}", document.document_key))
        .authorization_bearer(&alice.token)
        .await
        .assert_status_ok();

    assert!(app.storage.is_empty().await);
    let gone = get_document(&app, Some(&alice), &document.document_key).await;
    assert_error(&gone, StatusCode::NOT_FOUND, "document_missing");

    let kept = app
        .server
        .get(&format!("/api/v1/conversations/{}", conversation.id))
        .authorization_bearer(&bob.token)
        .await;
    assert_eq!(kept.status_code(), StatusCode::OK);
    assert_eq!(kept.json::<serde_json::Value>()["document_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_star_is_idempotent() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let document = upload_document(&app, &alice, "Starred", false).await;
    let path = format!("/api/v1/documents/stars/{}", document.id);

    for _ in 0..2 {
        app.server
            .post(&path)
            .authorization_bearer(&bob.token)
            .await
            .assert_status_ok();
    }

    let status: StarStatus = app.server.get(&path).authorization_bearer(&bob.token).await.json();
    assert_eq!(status, StarStatus { total_stars: 1, user_starred: true });

    let owner_view: StarStatus = app.server.get(&path).authorization_bearer(&alice.token).await.json();
    assert_eq!(owner_view, StarStatus { total_stars: 1, user_starred: false });

    let fetched: DocumentResponse = get_document(&app, Some(&bob), &document.document_key)
        .await
        .json();
    assert_eq!(fetched.total_stars, 1);
    assert!(fetched.user_starred);

    app.server
        .delete(&path)
        .authorization_bearer(&bob.token)
        .await
        .assert_status_ok();
    let status: StarStatus = app.server.get(&path).authorization_bearer(&bob.token).await.json();
    assert_eq!(status, StarStatus { total_stars: 0, user_starred: false });
}

#[tokio::test]
async fn test_star_private_document_of_another_user() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let document = upload_document(&app, &alice, "Hidden", true).await;

    let response = app
        .server
        .post(&format!("/api/v1/documents/stars/{}", document.id))
        .authorization_bearer(&bob.token)
        .await;

    assert_error(&response, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_public_listing_orders() {
    let app = TestApp::new().await;
    let alice = register_with_tier(&app, "alice", AccountTier::Premium).await;
    let bob = register_user(&app, "bob").await;
    let first = upload_document(&app, &alice, "First", false).await;
    let second = upload_document(&app, &alice, "Second", false).await;
    let third = upload_document(&app, &alice, "Third", false).await;

    // Two views on the first, one on the third
    start_conversation(&app, &bob, &first).await;
    start_conversation(&app, &bob, &first).await;
    start_conversation(&app, &bob, &third).await;
    app.server
        .post(&format!("/api/v1/documents/stars/{}", second.id))
        .authorization_bearer(&bob.token)
        .await
        .assert_status_ok();

    let titles = |docs: Vec<DocumentResponse>| docs.into_iter().map(|d| d.title).collect::<Vec<_>>();

    let explore: Vec<DocumentResponse> = app.server.get("/api/v1/documents/public/explore").await.json();
    assert_eq!(explore[0].views, 2);
    assert_eq!(titles(explore), vec!["First", "Third", "Second"]);

    let trending: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents/public/explore/trending")
        .await
        .json();
    assert_eq!(trending[0].title, "Second");
    assert_eq!(trending[0].total_stars, 1);

    let latest: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents/public/explore/latest")
        .await
        .json();
    assert_eq!(titles(latest), vec!["Third", "Second", "First"]);

    let second_page: Vec<DocumentResponse> = app
        .server
        .get("/api/v1/documents/public/explore/latest")
        .add_query_param("page", 2)
        .await
        .json();
    assert!(second_page.is_empty());
}

#[tokio::test]
async fn test_ingestion_status_and_cancel() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;
    let bob = register_user(&app, "bob").await;
    let completed = upload_document(&app, &alice, "Indexed", false).await;
    let cancelled = upload_document(&app, &alice, "Abandoned", false).await;

    let status: IngestionStatusResponse = app
        .server
        .get(&format!("/api/v1/llm/ingestion_status/{}", completed.id))
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(status.ingestion_status, IngestionStatus::Completed);

    let cancel: IngestionStatusResponse = app
        .server
        .delete(&format!("/api/v1/llm/cancel_ingestion/{}", cancelled.id))
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(cancel.ingestion_status, IngestionStatus::Terminated);

    let after: IngestionStatusResponse = app
        .server
        .get(&format!("/api/v1/llm/ingestion_status/{}", cancelled.id))
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(after.ingestion_status, IngestionStatus::Terminated);

    let foreign = app
        .server
        .get(&format!("/api/v1/llm/ingestion_status/{}", completed.id))
        .authorization_bearer(&bob.token)
        .await;
    assert_error(&foreign, StatusCode::FORBIDDEN, "forbidden");
}

#[tokio::test]
async fn test_malformed_path_and_query_are_unprocessable() {
    let app = TestApp::new().await;
    let alice = register_user(&app, "alice").await;

    let bad_id = app
        .server
        .post("/api/v1/documents/stars/12345")
        .authorization_bearer(&alice.token)
        .await;
    assert_error(&bad_id, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_input");

    let bad_page = app.server.get("/api/v1/documents/public/explore?page=first").await;
    assert_error(&bad_page, StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_input");
}
