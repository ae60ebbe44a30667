//! Provider adapters for TeamMate.
//!
//! The text generator implements `teammate_core::TextGenerator`, the vector
//! store implements `teammate_core::VectorStore`. Both translate their
//! backend's failures into the core error taxonomy.

pub mod openai_compat;
pub mod records;
pub mod weaviate;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use teammate_config::AppConfig;
use teammate_core::error::{ProviderError, VectorStoreError};
use teammate_core::provider::TextGenerator;
use teammate_core::vector::VectorStore;

pub use openai_compat::OpenAiCompatProvider;
pub use weaviate::WeaviateStore;

/// Build the text generator described by the configuration.
pub fn build_generator(config: &AppConfig) -> Result<Arc<dyn TextGenerator>, ProviderError> {
    let generation = &config.generation;
    let api_key = generation.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured("OPENAI_API_KEY is not set".into())
    })?;

    let provider = OpenAiCompatProvider::new(
        "openai",
        &generation.api_url,
        api_key,
        Duration::from_secs(generation.timeout_secs),
    )?
    .with_model(&generation.model)
    .with_temperature(generation.temperature)
    .with_system_prompt(&generation.system_prompt);

    Ok(Arc::new(provider))
}

/// Build the vector store described by the configuration.
pub fn build_vector_store(config: &AppConfig) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    let store = WeaviateStore::new(
        &config.vector_store.url,
        Duration::from_secs(config.vector_store.timeout_secs),
    )?;
    Ok(Arc::new(store))
}
