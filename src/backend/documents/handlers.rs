/**
 * Document Handlers
 *
 * HTTP surface of the document engine. Uploads and re-uploads are
 * `multipart/form-data` with the fields:
 *
 * - `file` - the document bytes (required)
 * - `title` - required on upload, optional on re-upload
 * - `is_private` - `true`/`false`, optional
 * - `document_key` - lineage to re-upload into (re-upload only)
 *
 * Listings are decorated with star counts and the caller's starred flag.
 */

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::auth::service::IdentityService;
use crate::backend::documents::service::{DocumentEngine, ReuploadDocument, UploadDocument};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::{ApiPath, ApiQuery, AuthUser, MaybeAuthUser};
use crate::shared::documents::{DocumentResponse, DocumentStats, IngestionStatusResponse, StarStatus};
use crate::shared::pagination::PageQuery;

/// Fields collected from an upload form
#[derive(Debug, Default)]
struct DocumentForm {
    title: Option<String>,
    is_private: Option<bool>,
    document_key: Option<String>,
    file: Option<Bytes>,
}

impl DocumentForm {
    async fn parse(mut multipart: Multipart) -> BackendResult<Self> {
        let mut form = DocumentForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => form.file = Some(field.bytes().await.map_err(multipart_error)?),
                "title" => form.title = Some(field.text().await.map_err(multipart_error)?),
                "document_key" => {
                    form.document_key = Some(field.text().await.map_err(multipart_error)?)
                }
                "is_private" => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    form.is_private = Some(parse_flag(&raw)?);
                }
                other => tracing::debug!("Ignoring unknown form field: {}", other),
            }
        }
        Ok(form)
    }

    fn take_file(&mut self) -> BackendResult<Bytes> {
        self.file
            .take()
            .ok_or_else(|| BackendError::unprocessable("file", "a file is required"))
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> BackendError {
    BackendError::unprocessable("file", err.body_text())
}

fn parse_flag(raw: &str) -> BackendResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        _ => Err(BackendError::unprocessable(
            "is_private",
            format!("'{raw}' is not a boolean"),
        )),
    }
}

/// GET /documents
pub async fn list_owned(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(documents.list_owned(&user).await?))
}

/// POST /documents
pub async fn upload(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> BackendResult<(StatusCode, Json<DocumentResponse>)> {
    let mut form = DocumentForm::parse(multipart).await?;
    let bytes = form.take_file()?;
    let title = form
        .title
        .ok_or_else(|| BackendError::unprocessable("title", "a title is required"))?;

    let document = documents
        .upload(
            &user,
            UploadDocument {
                title,
                bytes,
                is_private: form.is_private.unwrap_or(false),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document.into_response(0, false))))
}

/// PATCH /documents
pub async fn reupload(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> BackendResult<Json<DocumentResponse>> {
    let mut form = DocumentForm::parse(multipart).await?;
    let bytes = form.take_file()?;
    let document_key = form
        .document_key
        .ok_or_else(|| BackendError::unprocessable("document_key", "a document key is required"))?;

    let document = documents
        .reupload(
            &user,
            ReuploadDocument {
                document_key,
                title: form.title,
                bytes,
                is_private: form.is_private,
            },
        )
        .await?;
    Ok(Json(document.into_response(0, false)))
}

/// GET /documents/stats
pub async fn stats(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<DocumentStats>> {
    Ok(Json(documents.stats(&user).await?))
}

/// GET /documents/{document_key}
pub async fn get_document(
    State(documents): State<DocumentEngine>,
    viewer: MaybeAuthUser,
    ApiPath(document_key): ApiPath<String>,
) -> BackendResult<Json<DocumentResponse>> {
    let document = documents.get(&document_key, viewer.user()).await?;
    let mut decorated = documents.decorate(vec![document], viewer.user()).await?;
    decorated
        .pop()
        .map(Json)
        .ok_or_else(|| BackendError::internal("decorating a document returned nothing"))
}

/// DELETE /documents/{document_key}
pub async fn delete_document(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_key): ApiPath<String>,
) -> BackendResult<Json<MessageResponse>> {
    documents.delete(&user, &document_key).await?;
    Ok(Json(MessageResponse::new("Document deleted")))
}

/// GET /documents/stars/{document_id}
pub async fn star_status(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> BackendResult<Json<StarStatus>> {
    Ok(Json(documents.star_status(&user, document_id).await?))
}

/// POST /documents/stars/{document_id}
pub async fn star(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    documents.star(&user, document_id).await?;
    Ok(Json(MessageResponse::new("Document starred")))
}

/// DELETE /documents/stars/{document_id}
pub async fn unstar(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> BackendResult<Json<MessageResponse>> {
    documents.unstar(&user, document_id).await?;
    Ok(Json(MessageResponse::new("Document unstarred")))
}

/// GET /documents/public/user/{username}
pub async fn list_user_documents(
    State(documents): State<DocumentEngine>,
    State(identity): State<IdentityService>,
    viewer: MaybeAuthUser,
    ApiPath(username): ApiPath<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> BackendResult<Json<Vec<DocumentResponse>>> {
    let owner = identity.get_profile_by_username(&username).await?;
    Ok(Json(documents.list_for_user(&owner, viewer.user(), query.page()).await?))
}

/// GET /documents/public/explore
pub async fn explore(
    State(documents): State<DocumentEngine>,
    viewer: MaybeAuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> BackendResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(documents.explore(viewer.user(), query.page()).await?))
}

/// GET /documents/public/explore/trending
pub async fn trending(
    State(documents): State<DocumentEngine>,
    viewer: MaybeAuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> BackendResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(documents.trending(viewer.user(), query.page()).await?))
}

/// GET /documents/public/explore/latest
pub async fn latest(
    State(documents): State<DocumentEngine>,
    viewer: MaybeAuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> BackendResult<Json<Vec<DocumentResponse>>> {
    Ok(Json(documents.latest(viewer.user(), query.page()).await?))
}

/// GET /llm/ingestion_status/{document_id}
pub async fn ingestion_status(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> BackendResult<Json<IngestionStatusResponse>> {
    Ok(Json(documents.ingestion_status(&user, document_id).await?))
}

/// DELETE /llm/cancel_ingestion/{document_id}
pub async fn cancel_ingestion(
    State(documents): State<DocumentEngine>,
    AuthUser(user): AuthUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> BackendResult<Json<IngestionStatusResponse>> {
    Ok(Json(documents.cancel_ingestion(&user, document_id).await?))
}
