//! In-memory doubles for gateway tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use teammate_core::error::{ProviderError, VectorStoreError};
use teammate_core::provider::TextGenerator;
use teammate_core::vector::{ClassDefinition, VectorStore};

/// A vector store that keeps class names in memory.
#[derive(Default)]
pub struct MemoryStore {
    classes: Mutex<Vec<String>>,
    reject_class: Option<String>,
    offline: bool,
    imports: Mutex<Vec<(PathBuf, String, Vec<u8>)>>,
}

impl MemoryStore {
    pub fn with_classes(names: &[&str]) -> Self {
        let store = Self::default();
        *store.classes.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        store
    }

    /// Fails to create `class`.
    pub fn rejecting(class: &str) -> Self {
        Self {
            reject_class: Some(class.to_string()),
            ..Self::default()
        }
    }

    /// Every backend call fails.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.lock().unwrap().clone()
    }

    /// `(staged path, class, staged bytes)` for every import.
    pub fn imports(&self) -> Vec<(PathBuf, String, Vec<u8>)> {
        self.imports.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), VectorStoreError> {
        if self.offline {
            Err(VectorStoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_class(&self, class: &ClassDefinition) -> Result<Value, VectorStoreError> {
        self.check_online()?;
        if self.reject_class.as_deref() == Some(class.class.as_str()) {
            return Err(VectorStoreError::Rejected {
                status_code: 422,
                message: format!("class name {} already exists", class.class),
            });
        }
        self.classes.lock().unwrap().push(class.class.clone());
        Ok(json!({"class": class.class}))
    }

    async fn delete_all_classes(&self) -> Result<usize, VectorStoreError> {
        self.check_online()?;
        let mut classes = self.classes.lock().unwrap();
        let n = classes.len();
        classes.clear();
        Ok(n)
    }

    async fn get_schema(&self) -> Result<Value, VectorStoreError> {
        self.check_online()?;
        let classes: Vec<Value> = self
            .class_names()
            .into_iter()
            .map(|c| json!({"class": c}))
            .collect();
        Ok(json!({"classes": classes}))
    }

    async fn import_records(&self, source: &Path, class_name: &str) -> Result<usize, VectorStoreError> {
        self.check_online()?;
        let bytes = std::fs::read(source).map_err(|e| VectorStoreError::Io(e.to_string()))?;
        let rows = bytes.iter().filter(|b| **b == b'\n').count().saturating_sub(1);
        self.imports
            .lock()
            .unwrap()
            .push((source.to_path_buf(), class_name.to_string(), bytes));
        Ok(rows)
    }

    async fn search(&self, query: &str, class_name: &str) -> Result<Value, VectorStoreError> {
        self.check_online()?;
        Ok(json!({"data": {"Get": {class_name: [{"title": format!("match for {query}")}]}}}))
    }

    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(!self.offline)
    }
}

/// Replies with the prompt, prefixed.
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str, _context: Option<&str>) -> Result<String, ProviderError> {
        Ok(format!("echo: {prompt}"))
    }
}
