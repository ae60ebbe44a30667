//! Weaviate vector store over its REST and GraphQL APIs.
//!
//! - `POST   /v1/schema`             create a class
//! - `GET    /v1/schema`             read the live schema
//! - `DELETE /v1/schema/{class}`     drop a class
//! - `POST   /v1/batch/objects`      bulk import
//! - `POST   /v1/graphql`            `nearText` search
//! - `GET    /v1/.well-known/ready`  readiness

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use teammate_core::error::VectorStoreError;
use teammate_core::vector::{ClassDefinition, SchemaDefinition, VectorStore};
use tracing::{debug, info, warn};

use crate::records::parse_csv;

/// Objects per batch request.
const BATCH_SIZE: usize = 100;

/// A Weaviate client.
pub struct WeaviateStore {
    base_url: String,
    client: reqwest::Client,
}

impl WeaviateStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VectorStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorStoreError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.base_url)
    }

    /// Send a request and decode a JSON body, mapping non-2xx to `Rejected`.
    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, VectorStoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "Vector store returned error");
            return Err(VectorStoreError::Rejected {
                status_code: status.as_u16(),
                message: body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    /// Properties to select for `class_name`, from the live schema.
    async fn searchable_properties(&self, class_name: &str) -> Vec<String> {
        match self.get_schema().await {
            Ok(schema) => serde_json::from_value::<SchemaDefinition>(schema)
                .ok()
                .and_then(|s| s.classes.into_iter().find(|c| c.class == class_name))
                .map(|c| c.property_names())
                .unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "Could not read schema for property selection");
                Vec::new()
            }
        }
    }
}

/// Class names are interpolated into GraphQL and URL paths.
fn validate_class_name(class_name: &str) -> Result<(), VectorStoreError> {
    let valid = class_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && class_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(VectorStoreError::Rejected {
            status_code: 400,
            message: format!("invalid class name: {class_name:?}"),
        })
    }
}

/// Build the `nearText` GraphQL query.
fn near_text_query(query: &str, class_name: &str, properties: &[String]) -> String {
    // A JSON string literal is a valid GraphQL string literal.
    let concept = Value::String(query.to_string()).to_string();
    let selection = if properties.is_empty() {
        "_additional { id distance }".to_string()
    } else {
        format!("{} _additional {{ id distance }}", properties.join(" "))
    };
    format!("{{ Get {{ {class_name}(nearText: {{ concepts: [{concept}] }}) {{ {selection} }} }} }}")
}

/// Count batch results that carry no per-object errors.
fn count_accepted(response: &Value) -> usize {
    response
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| item.pointer("/result/errors").is_none_or(Value::is_null))
                .count()
        })
        .unwrap_or(0)
}

#[async_trait]
impl VectorStore for WeaviateStore {
    fn name(&self) -> &str {
        "weaviate"
    }

    async fn create_class(&self, class: &ClassDefinition) -> Result<Value, VectorStoreError> {
        validate_class_name(&class.class)?;
        info!(class = %class.class, "Creating class");
        self.send_json(self.client.post(self.url("/schema")).json(class))
            .await
    }

    async fn delete_all_classes(&self) -> Result<usize, VectorStoreError> {
        let schema: SchemaDefinition = serde_json::from_value(self.get_schema().await?)
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        for class in &schema.classes {
            validate_class_name(&class.class)?;
            info!(class = %class.class, "Deleting class");
            self.send_json(
                self.client
                    .delete(self.url(&format!("/schema/{}", class.class))),
            )
            .await?;
        }
        Ok(schema.classes.len())
    }

    async fn get_schema(&self) -> Result<Value, VectorStoreError> {
        self.send_json(self.client.get(self.url("/schema"))).await
    }

    async fn import_records(&self, source: &Path, class_name: &str) -> Result<usize, VectorStoreError> {
        validate_class_name(class_name)?;

        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| VectorStoreError::Io(format!("{}: {e}", source.display())))?;
        let records = parse_csv(&bytes)?;

        let mut accepted = 0;
        for chunk in records.chunks(BATCH_SIZE) {
            let objects: Vec<Value> = chunk
                .iter()
                .map(|properties| json!({ "class": class_name, "properties": properties }))
                .collect();

            let response = self
                .send_json(
                    self.client
                        .post(self.url("/batch/objects"))
                        .json(&json!({ "objects": objects })),
                )
                .await?;
            accepted += count_accepted(&response);
        }

        info!(class = %class_name, total = records.len(), accepted, "Imported records");
        Ok(accepted)
    }

    async fn search(&self, query: &str, class_name: &str) -> Result<Value, VectorStoreError> {
        validate_class_name(class_name)?;
        let properties = self.searchable_properties(class_name).await;
        let graphql = near_text_query(query, class_name, &properties);
        debug!(class = %class_name, query_len = query.len(), "Semantic search");

        let mut body = Map::new();
        body.insert("query".into(), Value::String(graphql));
        self.send_json(self.client.post(self.url("/graphql")).json(&body))
            .await
    }

    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        let response = self
            .client
            .get(self.url("/.well-known/ready"))
            .send()
            .await
            .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;
    use axum::Router;
    use axum::extract::Path as UrlPath;
    use axum::http::StatusCode;
    use axum::response::Json;
    use axum::routing::{delete, get, post};

    #[test]
    fn urls_are_versioned() {
        let store = WeaviateStore::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(store.url("/schema"), "http://localhost:8080/v1/schema");
        assert_eq!(store.name(), "weaviate");
    }

    #[test]
    fn class_name_validation() {
        assert!(validate_class_name("Job").is_ok());
        assert!(validate_class_name("Job_2024").is_ok());
        assert!(validate_class_name("").is_err());
        assert!(validate_class_name("1Job").is_err());
        assert!(validate_class_name("Job) { __schema").is_err());
    }

    #[test]
    fn near_text_query_with_properties() {
        let q = near_text_query("rust \"backend\"", "Job", &["title".into(), "company".into()]);
        assert_eq!(
            q,
            r#"{ Get { Job(nearText: { concepts: ["rust \"backend\""] }) { title company _additional { id distance } } } }"#
        );
    }

    #[test]
    fn near_text_query_without_properties() {
        let q = near_text_query("x", "Job", &[]);
        assert!(q.contains("{ _additional { id distance } }"));
    }

    #[test]
    fn accepted_count_skips_errors() {
        let response = json!([
            {"id": "1", "result": {}},
            {"id": "2", "result": {"errors": {"error": [{"message": "bad"}]}}},
            {"id": "3"}
        ]);
        assert_eq!(count_accepted(&response), 2);
        assert_eq!(count_accepted(&Value::Null), 0);
    }

    async fn against(router: Router) -> WeaviateStore {
        let base = crate::testing::serve(router).await;
        WeaviateStore::new(base, Duration::from_secs(5)).unwrap()
    }

    fn job_schema() -> Value {
        json!({"classes": [
            {"class": "Job", "properties": [{"name": "title"}, {"name": "company"}]},
            {"class": "Company"}
        ]})
    }

    #[tokio::test]
    async fn rejected_class_keeps_status_and_body() {
        let router = Router::new().route(
            "/v1/schema",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "class name Job already exists") }),
        );
        let class: ClassDefinition = serde_json::from_value(json!({"class": "Job"})).unwrap();

        let err = against(router).await.create_class(&class).await.unwrap_err();
        match err {
            VectorStoreError::Rejected {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 422);
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let router = Router::new().route("/v1/schema", get(|| async { "not json" }));
        let err = against(router).await.get_schema().await.unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn search_selects_schema_properties_and_returns_raw_json() {
        let router = Router::new()
            .route("/v1/schema", get(|| async { Json(job_schema()) }))
            .route(
                "/v1/graphql",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({"data": {"Get": {"Job": []}}, "query": body["query"]}))
                }),
            );

        let result = against(router).await.search("rust", "Job").await.unwrap();
        assert_eq!(result["data"]["Get"]["Job"], json!([]));
        let query = result["query"].as_str().unwrap();
        assert!(query.contains("{ title company _additional { id distance } }"));
    }

    #[tokio::test]
    async fn delete_all_classes_drops_each_class() {
        let deleted = Arc::new(Mutex::new(Vec::new()));
        let seen = deleted.clone();
        let router = Router::new()
            .route("/v1/schema", get(|| async { Json(job_schema()) }))
            .route(
                "/v1/schema/{class}",
                delete(move |UrlPath(class): UrlPath<String>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(class);
                        StatusCode::OK
                    }
                }),
            );

        let count = against(router).await.delete_all_classes().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(*deleted.lock().unwrap(), vec!["Job", "Company"]);
    }

    #[tokio::test]
    async fn import_counts_objects_without_errors() {
        let router = Router::new().route(
            "/v1/batch/objects",
            post(|Json(body): Json<Value>| async move {
                let objects = body["objects"].as_array().cloned().unwrap_or_default();
                let results: Vec<Value> = objects
                    .iter()
                    .enumerate()
                    .map(|(i, object)| {
                        assert_eq!(object["class"], "Job");
                        if i == 0 {
                            json!({"result": {"errors": {"error": [{"message": "bad"}]}}})
                        } else {
                            json!({"result": {}})
                        }
                    })
                    .collect();
                Json(Value::Array(results))
            }),
        );
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        csv.write_all(b"title,company\nRust Engineer,Acme\nSRE,Initech\nQA,Globex\n")
            .unwrap();

        let accepted = against(router)
            .await
            .import_records(csv.path(), "Job")
            .await
            .unwrap();
        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    async fn batch_rejection_fails_import() {
        let router = Router::new().route(
            "/v1/batch/objects",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "disk full") }),
        );
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        csv.write_all(b"title\nRust Engineer\n").unwrap();

        let err = against(router)
            .await
            .import_records(csv.path(), "Job")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::Rejected {
                status_code: 500,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn health_follows_readiness() {
        let router = Router::new().route(
            "/v1/.well-known/ready",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        assert!(!against(router).await.health_check().await.unwrap());
    }
}
