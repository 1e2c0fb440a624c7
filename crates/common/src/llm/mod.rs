//! Language model client abstraction
//!
//! Provides a unified interface for the reasoning loop's LLM collaborator:
//! - Ollama (local llama3, phi3, etc. via /api/generate)
//! - Mock (scripted responses for tests and offline runs)

use crate::config::LlmConfig;
use crate::errors::{CogragError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default system prompt prepended to every generate call
const SYSTEM_PROMPT: &str = "You are a helpful reasoning agent.";

/// Trait for text generation
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate free-form text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Ollama generate client
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: String, model: String, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            model,
            max_retries,
        }
    }

    /// Make request with retry
    async fn request_with_retry(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * (2_u64.pow(attempt)));
                tokio::time::sleep(delay).await;
            }

            match self.make_request(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "LLM request failed, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CogragError::LlmBackend {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        // Ollama expects the model name to carry a tag
        let model = if self.model.contains(':') {
            self.model.clone()
        } else {
            format!("{}:latest", self.model)
        };

        let request = OllamaRequest {
            model,
            prompt: format!("{}\n\n{}", SYSTEM_PROMPT, prompt),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CogragError::LlmBackend {
                message: format!("Request failed: {}", e),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CogragError::LlmBackend {
                message: format!(
                    "Ollama endpoint not found at {} (is `ollama serve` running and the model pulled?)",
                    url
                ),
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CogragError::LlmBackend {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: OllamaResponse =
            response.json().await.map_err(|e| CogragError::LlmBackend {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(result.response)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.request_with_retry(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Scripted language model for tests and offline runs.
///
/// Responses are returned in FIFO order; once the script is exhausted every
/// call yields a generic "keep expanding" directive.
pub struct MockLanguageModel {
    responses: Mutex<VecDeque<String>>,
}

/// Directive returned by the mock once its script is exhausted
const MOCK_FALLBACK: &str = "HYPOTHESIS: Need more info.\nACTION: EXPAND: generic";

impl MockLanguageModel {
    /// Create a mock with no scripted responses
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a mock that replays the given responses in order
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let mut responses = self.responses.lock().expect("mock response lock");
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| MOCK_FALLBACK.to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

/// Create a language model based on configuration
pub fn create_language_model(config: &LlmConfig) -> Arc<dyn LanguageModel> {
    match config.provider.as_str() {
        "ollama" => Arc::new(OllamaClient::new(
            config.base_url.clone(),
            config.model.clone(),
            config.max_retries,
        )),
        "mock" => Arc::new(MockLanguageModel::new()),
        other => {
            tracing::warn!(provider = other, "Unknown LLM provider, using mock");
            Arc::new(MockLanguageModel::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let llm = MockLanguageModel::with_responses(["first", "second"]);
        assert_eq!(llm.generate("p").await.unwrap(), "first");
        assert_eq!(llm.generate("p").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_mock_falls_back_to_expand() {
        let llm = MockLanguageModel::new();
        let text = llm.generate("p").await.unwrap();
        assert!(text.contains("EXPAND"));
    }

    #[test]
    fn test_factory_unknown_provider_uses_mock() {
        let config = LlmConfig {
            provider: "gpt-9000".into(),
            ..Default::default()
        };
        let llm = create_language_model(&config);
        assert_eq!(llm.model_name(), "mock-llm");
    }
}
