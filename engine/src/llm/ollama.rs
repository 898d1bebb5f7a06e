//! Ollama Generative Provider
//!
//! Implements [`GenerativeProvider`] on top of a local Ollama server,
//! typically at http://localhost:11434, using the non-streaming
//! `/api/chat` endpoint.
//!
//! Errors are mapped to `ProviderError`:
//! - connection refused → `Unavailable`
//! - request timeout → `Timeout`
//! - non-2xx status → `Unavailable` with the server's message
//! - undecodable body → `InvalidResponse`

use async_trait::async_trait;
use reqwest::Client;
use sdk::collaborators::GenerativeProvider;
use sdk::errors::{EngineError, ProviderError};
use sdk::types::PersonalizationContext;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{reply_messages, Message};
use crate::config::GeneratorConfig;

/// Ollama-backed generative provider
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    model: String,

    client: Client,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Provider` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Create a generator from the `[generator]` config section
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, EngineError> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        debug!(
            "Ollama request: model={}, messages={}, total_chars={}",
            self.model,
            messages.len(),
            messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let request = OllamaRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::Unavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        info!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(body.message.content.trim().to_string())
    }
}

#[async_trait]
impl GenerativeProvider for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        context: &PersonalizationContext,
    ) -> Result<String, ProviderError> {
        self.chat(reply_messages(prompt, context)).await
    }

    async fn classify_intent(&self, text: &str) -> Result<String, ProviderError> {
        let label = self
            .chat(vec![
                Message::system(
                    "Classify the user's request. Reply with exactly one word from: \
                     scheduling, task_management, communication, information_retrieval, general.",
                ),
                Message::user(text),
            ])
            .await?;
        Ok(label.to_lowercase())
    }

    async fn summarize(&self, text: &str, max_length: usize) -> Result<String, ProviderError> {
        let summary = self
            .chat(vec![
                Message::system(format!(
                    "Summarize the user's text in at most {} characters. Reply with the summary only.",
                    max_length
                )),
                Message::user(text),
            ])
            .await?;
        Ok(summary.chars().take(max_length).collect())
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        self.chat(vec![
            Message::system(format!(
                "Translate the user's text into the language with code '{}'. \
                 Reply with the translation only.",
                target_language
            )),
            Message::user(text),
        ])
        .await
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_properties() {
        let generator =
            OllamaGenerator::new("http://localhost:11434/", "llama3.1:8b", Duration::from_secs(5))
                .unwrap();

        assert_eq!(generator.name(), "ollama");
        assert_eq!(generator.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_from_config() {
        let generator = OllamaGenerator::from_config(&GeneratorConfig::default()).unwrap();
        assert_eq!(generator.model, "llama3.1:8b");
    }

    #[test]
    fn test_response_parsing_ignores_extra_fields() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":" hi "},"done":true}"#;
        let parsed: OllamaResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content, " hi ");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Port 9 (discard) is closed on test machines
        let generator =
            OllamaGenerator::new("http://127.0.0.1:9", "m", Duration::from_secs(2)).unwrap();

        let err = generator
            .generate("hi", &PersonalizationContext::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unavailable(_) | ProviderError::Network(_) | ProviderError::Timeout
        ));
    }
}
