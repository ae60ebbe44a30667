//! Schema management against the vector store.
//!
//! The schema document is a JSON file of the form `{"classes": [...]}`.
//! Creation is not transactional: classes created before a failure stay.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use teammate_core::error::SchemaError;
use teammate_core::vector::{SchemaDefinition, VectorStore};
use tracing::{debug, info, warn};

/// Applies a schema file to a vector store.
pub struct SchemaManager {
    store: Arc<dyn VectorStore>,
    path: PathBuf,
}

impl SchemaManager {
    pub fn new(store: Arc<dyn VectorStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the schema file.
    pub async fn load(&self) -> Result<SchemaDefinition, SchemaError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SchemaError::NotFound {
                    path: self.path.clone(),
                },
                _ => SchemaError::Malformed {
                    path: self.path.clone(),
                    reason: e.to_string(),
                },
            })?;

        serde_json::from_str(&content).map_err(|e| SchemaError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Create every declared class, stopping at the first failure.
    ///
    /// Returns the number of classes created.
    pub async fn create(&self) -> Result<usize, SchemaError> {
        let schema = self.load().await?;
        for class in &schema.classes {
            info!(class = %class.class, "Creating class");
            let response = self
                .store
                .create_class(class)
                .await
                .map_err(|source| SchemaError::ClassCreation {
                    class: class.class.clone(),
                    source,
                })?;
            debug!(class = %class.class, response = %response, "Class created");
        }
        Ok(schema.classes.len())
    }

    /// Drop every class in the store, then recreate from the file.
    ///
    /// The file is read first so a bad file leaves the store untouched.
    pub async fn reset(&self) -> Result<usize, SchemaError> {
        self.load().await?;
        let deleted = self
            .store
            .delete_all_classes()
            .await
            .map_err(SchemaError::Reset)?;
        info!(deleted, "Schema cleared");
        self.create().await
    }

    /// Whether the live class names match the file's.
    ///
    /// Any failure to read either side counts as out of sync.
    pub async fn in_sync(&self) -> bool {
        let declared = match self.load().await {
            Ok(schema) => schema,
            Err(e) => {
                warn!(error = %e, "Error validating schema");
                return false;
            }
        };

        let live = match self.store.get_schema().await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Error validating schema");
                return false;
            }
        };

        let live: SchemaDefinition = match serde_json::from_value(live) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(error = %e, "Live schema is not a class list");
                return false;
            }
        };

        let declared: BTreeSet<&str> = declared.class_names().into_iter().collect();
        let live: BTreeSet<&str> = live.class_names().into_iter().collect();
        declared == live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use std::io::Write;
    use teammate_core::error::ErrorKind;

    fn schema_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const TWO_CLASSES: &str = r#"{"classes": [
        {"class": "Job", "properties": [{"name": "title", "dataType": ["text"]}]},
        {"class": "Company"}
    ]}"#;

    #[tokio::test]
    async fn create_applies_every_class() {
        let store = Arc::new(MemoryStore::default());
        let file = schema_file(TWO_CLASSES);
        let manager = SchemaManager::new(store.clone(), file.path());

        assert_eq!(manager.create().await.unwrap(), 2);
        assert_eq!(store.class_names(), vec!["Job", "Company"]);
    }

    #[tokio::test]
    async fn create_stops_at_first_failure() {
        let store = Arc::new(MemoryStore::rejecting("Company"));
        let file = schema_file(r#"{"classes": [{"class": "Job"}, {"class": "Company"}, {"class": "Skill"}]}"#);
        let manager = SchemaManager::new(store.clone(), file.path());

        let err = manager.create().await.unwrap_err();
        assert!(matches!(err, SchemaError::ClassCreation { ref class, .. } if class == "Company"));
        assert!(err.to_string().starts_with("Error creating class Company"));
        // Not rolled back.
        assert_eq!(store.class_names(), vec!["Job"]);
    }

    #[tokio::test]
    async fn missing_file_is_schema_file_error() {
        let store = Arc::new(MemoryStore::default());
        let manager = SchemaManager::new(store, "/nonexistent/schema.json");

        let err = manager.create().await.unwrap_err();
        assert!(matches!(err, SchemaError::NotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::SchemaFileError);
    }

    #[tokio::test]
    async fn malformed_file_is_schema_file_error() {
        let store = Arc::new(MemoryStore::default());
        let file = schema_file("{\"tables\": []}");
        let manager = SchemaManager::new(store.clone(), file.path());

        let err = manager.create().await.unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
        assert!(store.class_names().is_empty());
    }

    #[tokio::test]
    async fn reset_replaces_live_classes() {
        let store = Arc::new(MemoryStore::with_classes(&["Legacy"]));
        let file = schema_file(TWO_CLASSES);
        let manager = SchemaManager::new(store.clone(), file.path());

        assert!(!manager.in_sync().await);
        assert_eq!(manager.reset().await.unwrap(), 2);
        assert_eq!(store.class_names(), vec!["Job", "Company"]);
        assert!(manager.in_sync().await);
    }

    #[tokio::test]
    async fn reset_with_bad_file_leaves_store_alone() {
        let store = Arc::new(MemoryStore::with_classes(&["Legacy"]));
        let manager = SchemaManager::new(store.clone(), "/nonexistent/schema.json");

        assert!(manager.reset().await.is_err());
        assert_eq!(store.class_names(), vec!["Legacy"]);
    }

    #[tokio::test]
    async fn in_sync_ignores_class_order() {
        let store = Arc::new(MemoryStore::with_classes(&["Company", "Job"]));
        let file = schema_file(TWO_CLASSES);
        let manager = SchemaManager::new(store, file.path());
        assert!(manager.in_sync().await);
    }
}
