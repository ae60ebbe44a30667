//! OpenAI-compatible text generator.
//!
//! Works with OpenAI and any endpoint exposing `/chat/completions`
//! (OpenRouter, Ollama, vLLM, ...). One system message carrying the
//! retrieval context, one user message carrying the prompt.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teammate_core::error::ProviderError;
use teammate_core::provider::TextGenerator;
use tracing::{debug, warn};

/// Placeholder in the system prompt replaced by the retrieval context.
const CONTEXT_PLACEHOLDER: &str = "{context}";

/// An OpenAI-compatible chat-completions client.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    system_prompt: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible generator.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            system_prompt: format!(
                "You are TeamMate. TeamMate is a helpful assistant. Use the following context: {CONTEXT_PLACEHOLDER}"
            ),
            client,
        })
    }

    /// Create an OpenAI generator (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
            Duration::from_secs(120),
        )
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Build the two-message conversation sent to the API.
    ///
    /// An absent context renders as `None`, matching what the prompt has
    /// always shown the model when no retrieval is wired in.
    fn to_api_messages(&self, prompt: &str, context: Option<&str>) -> Vec<ApiMessage> {
        let system = self
            .system_prompt
            .replace(CONTEXT_PLACEHOLDER, context.unwrap_or("None"));
        vec![
            ApiMessage {
                role: "system".into(),
                content: Some(system),
            },
            ApiMessage {
                role: "user".into(),
                content: Some(prompt.to_string()),
            },
        ]
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        context: Option<&str>,
    ) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: &self.model,
            messages: self.to_api_messages(prompt, context),
            temperature: self.temperature,
        };

        debug!(
            provider = %self.name,
            model = %self.model,
            prompt_len = prompt.len(),
            has_context = context.is_some(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: status,
                message: format!("Failed to parse response: {e}"),
            })?;

        extract_content(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

/// Pull the first choice's text out of a completion response.
fn extract_content(response: ApiResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(ProviderError::EmptyResponse)
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
