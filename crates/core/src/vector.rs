//! VectorStore trait and schema definition types.
//!
//! A vector store holds named classes (collections) of objects and answers
//! semantic queries against them.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VectorStoreError;

/// A schema document: the set of classes to create in the vector store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub classes: Vec<ClassDefinition>,
}

impl SchemaDefinition {
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.class.as_str()).collect()
    }
}

/// One class definition. Everything besides the name is passed through to
/// the backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub class: String,

    #[serde(flatten)]
    pub definition: serde_json::Map<String, serde_json::Value>,
}

impl ClassDefinition {
    /// Names of the declared properties, if any.
    pub fn property_names(&self) -> Vec<String> {
        self.definition
            .get("properties")
            .and_then(|p| p.as_array())
            .map(|props| {
                props
                    .iter()
                    .filter_map(|p| p.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The core vector-store trait.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "weaviate").
    fn name(&self) -> &str;

    /// Create one class. Returns the backend's response body.
    async fn create_class(
        &self,
        class: &ClassDefinition,
    ) -> Result<serde_json::Value, VectorStoreError>;

    /// Delete every class. Returns how many were removed.
    async fn delete_all_classes(&self) -> Result<usize, VectorStoreError>;

    /// Fetch the live schema as the backend reports it.
    async fn get_schema(&self) -> Result<serde_json::Value, VectorStoreError>;

    /// Bulk-import the records in `source` into `class_name`.
    /// Returns the number of records accepted.
    async fn import_records(
        &self,
        source: &Path,
        class_name: &str,
    ) -> Result<usize, VectorStoreError>;

    /// Semantic search. The backend's raw result is returned unmodified.
    async fn search(
        &self,
        query: &str,
        class_name: &str,
    ) -> Result<serde_json::Value, VectorStoreError>;

    /// Health check: is the backend ready?
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }
}
