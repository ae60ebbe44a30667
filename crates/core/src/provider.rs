//! TextGenerator trait: the abstraction over the text-generation backend.
//!
//! A generator takes the user's text plus optional retrieval context and
//! returns the assistant's reply as one complete string.
//!
//! Implementations: OpenAI-compatible chat completions.

use async_trait::async_trait;

use crate::error::ProviderError;

/// The core text-generation trait.
///
/// The protocol engine calls `generate()` without knowing which backend
/// answers. Timeouts are the implementation's concern.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// A human-readable name for this generator (e.g., "openai").
    fn name(&self) -> &str;

    /// Generate a reply to `prompt`, optionally grounded in `context`.
    async fn generate(
        &self,
        prompt: &str,
        context: Option<&str>,
    ) -> std::result::Result<String, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            prompt: &str,
            context: Option<&str>,
        ) -> Result<String, ProviderError> {
            Ok(format!("{prompt}|{}", context.unwrap_or("-")))
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let generator: std::sync::Arc<dyn TextGenerator> = std::sync::Arc::new(EchoGenerator);
        assert_eq!(generator.generate("hi", None).await.unwrap(), "hi|-");
        assert_eq!(generator.generate("hi", Some("ctx")).await.unwrap(), "hi|ctx");
        assert!(generator.health_check().await.unwrap());
    }
}
