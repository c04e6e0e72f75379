//! Document upload helpers
//!
//! Uploads go through the multipart endpoints exactly as a client sends them.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestResponse;

use docqa::shared::documents::DocumentResponse;

use super::auth_helpers::TestUser;
use super::database::TestApp;

fn file_part(contents: &str) -> Part {
    Part::bytes(contents.as_bytes().to_vec())
        .file_name("document.txt")
        .mime_type("text/plain")
}

/// Send an upload and return the raw response
pub async fn try_upload(app: &TestApp, user: &TestUser, title: &str, is_private: bool) -> TestResponse {
    let form = MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("is_private", is_private.to_string())
        .add_part("file", file_part(&format!("contents of {title}")));

    app.server
        .post("/api/v1/documents")
        .authorization_bearer(&user.token)
        .multipart(form)
        .await
}

/// Upload a document that is expected to succeed
pub async fn upload_document(
    app: &TestApp,
    user: &TestUser,
    title: &str,
    is_private: bool,
) -> DocumentResponse {
    let response = try_upload(app, user, title, is_private).await;
    assert_eq!(
        response.status_code(),
        StatusCode::CREATED,
        "upload failed: {}",
        response.text()
    );
    response.json()
}

/// Send a re-upload of `document_key` keeping the stored title and visibility
pub async fn try_reupload(app: &TestApp, user: &TestUser, document_key: &str) -> TestResponse {
    let form = MultipartForm::new()
        .add_text("document_key", document_key.to_string())
        .add_part("file", file_part("revised contents"));

    app.server
        .patch("/api/v1/documents")
        .authorization_bearer(&user.token)
        .multipart(form)
        .await
}
