//! HTTP error mapping for the control surface.
//!
//! Every failure renders as `{"detail": "..."}` carrying the cause.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use teammate_core::error::{SchemaError, VectorStoreError};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Schema file or class creation failed.
    Schema(SchemaError),
    /// A vector-store call failed.
    VectorStore(VectorStoreError),
    /// The request is missing a required part.
    BadRequest(String),
    /// Local I/O failed.
    Internal(String),
}

impl From<SchemaError> for ApiError {
    fn from(e: SchemaError) -> Self {
        ApiError::Schema(e)
    }
}

impl From<VectorStoreError> for ApiError {
    fn from(e: VectorStoreError) -> Self {
        ApiError::VectorStore(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Schema(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::VectorStore(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), detail = %detail, "Request failed");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::path::PathBuf;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn schema_errors_are_500_with_detail() {
        let (status, body) = render(ApiError::from(SchemaError::NotFound {
            path: PathBuf::from("schema.json"),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Schema file not found: schema.json");
    }

    #[tokio::test]
    async fn vector_store_errors_are_500() {
        let (status, body) =
            render(ApiError::from(VectorStoreError::Unavailable("refused".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn bad_request_is_422() {
        let (status, _) = render(ApiError::BadRequest("no file".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
