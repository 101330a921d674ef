//! LLM client for API communication

use super::{LanguageModel, SamplingConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai";

/// Default model name
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Response from LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Number of tokens used
    pub tokens_used: Option<usize>,
}

/// Configuration for LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Whether the endpoint is a local Ollama server
    pub fn is_ollama(&self) -> bool {
        self.endpoint.contains("11434")
    }
}

/// LLM client for locating code
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generate a completion
    pub async fn complete_chat(
        &self,
        system: &str,
        user: &str,
        sampling: &SamplingConfig,
    ) -> Result<LlmResponse> {
        if self.config.is_ollama() {
            self.complete_ollama(system, user, sampling).await
        } else {
            self.complete_openai(system, user, sampling).await
        }
    }

    /// Generate completion using Ollama API
    async fn complete_ollama(
        &self,
        system: &str,
        user: &str,
        sampling: &SamplingConfig,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let request = OllamaGenerateRequest {
            model: self.config.model.clone(),
            system: system.to_string(),
            prompt: user.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                num_predict: i32::try_from(sampling.max_tokens).unwrap_or(i32::MAX),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed: {} - {}", status, body);
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: result.response,
            tokens_used: result.eval_count.and_then(|n| usize::try_from(n).ok()),
        })
    }

    /// Generate completion using OpenAI-compatible API
    async fn complete_openai(
        &self,
        system: &str,
        user: &str,
        sampling: &SamplingConfig,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let request = OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: Some(sampling.max_tokens),
            temperature: Some(sampling.temperature),
            top_p: Some(sampling.top_p),
            stream: false,
        };

        let mut req_builder = self.client.post(&url).json(&request);

        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send request to OpenAI-compatible API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI request failed: {} - {}", status, body);
        }

        let result: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no choices"))?;

        let tokens_used = result
            .usage
            .and_then(|u| usize::try_from(u.total_tokens).ok());

        Ok(LlmResponse {
            content,
            tokens_used,
        })
    }
}

#[async_trait::async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, system: &str, user: &str, sampling: &SamplingConfig) -> Result<String> {
        let response = self.complete_chat(system, user, sampling).await?;
        tracing::debug!("Model used {:?} tokens", response.tokens_used);
        Ok(response.content)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    eval_count: Option<i32>,
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: i32,
}

/// Prompts seen by a [`MockLlmClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPrompt {
    /// System instruction
    pub system: String,
    /// User content
    pub user: String,
}

/// Mock LLM client for testing
pub struct MockLlmClient {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    history: Mutex<Vec<RecordedPrompt>>,
}

impl MockLlmClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: None,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers every prompt with the same reply
    pub fn replying(response: &str) -> Self {
        let mut client = Self::new();
        client.default_response = Some(response.to_string());
        client
    }

    /// Add a mock response, used when the user prompt contains `prompt_contains`
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_string(), response.to_string()));
    }

    /// Prompts received so far
    pub fn history(&self) -> Vec<RecordedPrompt> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LanguageModel for MockLlmClient {
    async fn complete(&self, system: &str, user: &str, _sampling: &SamplingConfig) -> Result<String> {
        if let Ok(mut history) = self.history.lock() {
            history.push(RecordedPrompt {
                system: system.to_string(),
                user: user.to_string(),
            });
        }

        for (key, response) in &self.responses {
            if user.contains(key.as_str()) {
                return Ok(response.clone());
            }
        }

        self.default_response
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mock model has no response for this prompt"))
    }
}
