//! HTTP control surface: schema, bulk import and search.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::SharedState;
use crate::error::ApiError;

/// Multipart field carrying the CSV upload.
const UPLOAD_FIELD: &str = "csv_file";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatusResponse {
    pub in_sync: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoadDataParams {
    pub class_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub class_name: Option<String>,
}

/// `GET /`: liveness.
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// `POST /create-schema/`
pub async fn create_schema(
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let created = state.schema.create().await?;
    info!(created, "Schema created");
    Ok(Json(StatusResponse {
        status: "Schema created successfully",
    }))
}

/// `POST /reset-schema/`
pub async fn reset_schema(
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let created = state.schema.reset().await?;
    info!(created, "Schema reset");
    Ok(Json(StatusResponse {
        status: "Schema reset successfully",
    }))
}

/// `GET /schema-status/`
pub async fn schema_status(State(state): State<SharedState>) -> Json<SchemaStatusResponse> {
    Json(SchemaStatusResponse {
        in_sync: state.schema.in_sync().await,
    })
}

/// `POST /load-data/`: multipart upload of a CSV file.
///
/// The class comes from the `class_name` query parameter or form field.
/// The upload is staged to a file for the import and removed afterwards.
/// A failed import is reported in `status`; only local failures are errors.
pub async fn load_data(
    State(state): State<SharedState>,
    Query(params): Query<LoadDataParams>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut class_name = params.class_name;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("class_name") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                class_name = Some(value);
            }
            Some(UPLOAD_FIELD) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                upload = Some(bytes);
            }
            _ => {}
        }
    }

    let bytes = upload
        .ok_or_else(|| ApiError::BadRequest(format!("missing `{UPLOAD_FIELD}` upload")))?;
    let class_name = class_name.unwrap_or_else(|| state.default_class.clone());

    let staged = stage_upload(&state.staging_dir, &bytes).await?;
    info!(path = %staged.display(), bytes = bytes.len(), "CSV file staged");

    let imported = state.vector_store.import_records(&staged, &class_name).await;
    if let Err(e) = tokio::fs::remove_file(&staged).await {
        warn!(path = %staged.display(), error = %e, "Failed to remove staged upload");
    }

    match imported {
        Ok(accepted) => {
            info!(class = %class_name, accepted, "Data loaded successfully");
            Ok(Json(StatusResponse {
                status: "Data loaded successfully",
            }))
        }
        Err(e) => {
            warn!(class = %class_name, error = %e, "Failed to load data");
            Ok(Json(StatusResponse {
                status: "Failed to load data",
            }))
        }
    }
}

/// `POST /semantic-search/?query=..&class_name=..`
pub async fn semantic_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let class_name = params
        .class_name
        .unwrap_or_else(|| state.default_class.clone());
    let results = state
        .vector_store
        .search(&params.query, &class_name)
        .await?;
    Ok(Json(SearchResponse { results }))
}

/// Write an upload under `dir` with a fresh name.
async fn stage_upload(dir: &Path, bytes: &[u8]) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {e}", dir.display())))?;

    let path = dir.join(format!("{}.csv", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {e}", path.display())))?;
    Ok(path)
}
