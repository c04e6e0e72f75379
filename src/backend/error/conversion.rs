/**
 * Error Conversion
 *
 * `BackendError` implements `IntoResponse`, so handlers return
 * `Result<_, BackendError>` directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Forbidden: Premium tier required",
 *   "kind": "forbidden",
 *   "status": 403
 * }
 * ```
 *
 * Extractor rejections (malformed JSON, form, path or query input) convert
 * into `UnprocessableInput` so they carry the same body.
 */

use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_internal() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.kind(), self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable("body", rejection.body_text())
    }
}

impl From<FormRejection> for BackendError {
    fn from(rejection: FormRejection) -> Self {
        Self::unprocessable("body", rejection.body_text())
    }
}

impl From<PathRejection> for BackendError {
    fn from(rejection: PathRejection) -> Self {
        Self::unprocessable("path", rejection.body_text())
    }
}

impl From<QueryRejection> for BackendError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable("query", rejection.body_text())
    }
}
