//! LLM-assisted code location
//!
//! This module handles:
//! - The [`LanguageModel`] seam (system + user text in, reply text out)
//! - HTTP clients for OpenAI-compatible and Ollama endpoints
//! - Prompt generation for locating code from harvested comments

mod client;
mod prompts;

pub use client::{
    LlmClient, LlmConfig, LlmResponse, MockLlmClient, RecordedPrompt, DEFAULT_ENDPOINT,
    DEFAULT_MODEL,
};
pub use prompts::{LocatePrompt, LOCATE_SYSTEM_PROMPT};

use crate::error::{NavError, NavResult};
use crate::repo::LlmSettings;
use anyhow::Result;

/// Fixed sampling parameters for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens for response
    pub max_tokens: usize,
    /// Nucleus sampling cut-off
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 600,
            top_p: 1.0,
        }
    }
}

impl From<&LlmSettings> for SamplingConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
        }
    }
}

/// A text-completion model: one request, one reply, no streaming
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a system instruction plus user content into reply text
    async fn complete(&self, system: &str, user: &str, sampling: &SamplingConfig) -> Result<String>;
}

/// Build a client from settings, picking the first available API key
///
/// Keys are taken in order from `override_key` (flag or environment),
/// the config file, then the settings store. Remote endpoints without a
/// key are rejected before any work starts; Ollama needs none.
pub fn client_from_settings(
    settings: &LlmSettings,
    override_key: Option<&str>,
    stored_key: Option<String>,
) -> NavResult<LlmClient> {
    let config = LlmConfig {
        endpoint: settings
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string(),
        model: settings
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        api_key: non_blank(override_key.map(str::to_string))
            .or_else(|| non_blank(settings.api_key.clone()))
            .or_else(|| non_blank(stored_key)),
    };

    if config.api_key.is_none() && !config.is_ollama() {
        return Err(NavError::MissingApiKey);
    }

    Ok(LlmClient::new(config))
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_fatal_for_remote_endpoint() {
        let settings = LlmSettings::default();
        let err = client_from_settings(&settings, None, None).err().unwrap();
        assert!(matches!(err, NavError::MissingApiKey));
    }

    #[test]
    fn test_key_precedence() {
        let settings = LlmSettings {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };

        let client = client_from_settings(&settings, Some("from-env"), None).unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("from-env"));

        let client =
            client_from_settings(&settings, None, Some("from-store".to_string())).unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("from-config"));

        let client =
            client_from_settings(&LlmSettings::default(), None, Some("from-store".to_string()))
                .unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("from-store"));
    }

    #[test]
    fn test_blank_key_falls_through_to_next_source() {
        let settings = LlmSettings {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };

        let client = client_from_settings(&settings, Some("  "), None).unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("from-config"));

        let blank_config = LlmSettings {
            api_key: Some(String::new()),
            ..Default::default()
        };
        let client =
            client_from_settings(&blank_config, Some(""), Some("from-store".to_string())).unwrap();
        assert_eq!(client.config().api_key.as_deref(), Some("from-store"));

        let err = client_from_settings(&blank_config, None, Some(" ".to_string()))
            .err()
            .unwrap();
        assert!(matches!(err, NavError::MissingApiKey));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let settings = LlmSettings {
            endpoint: Some("http://localhost:11434/".to_string()),
            model: Some("llama3".to_string()),
            ..Default::default()
        };

        let client = client_from_settings(&settings, None, None).unwrap();
        assert!(client.config().is_ollama());
        assert_eq!(client.config().endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_sampling_from_settings() {
        let sampling = SamplingConfig::from(&LlmSettings::default());
        assert_eq!(sampling, SamplingConfig::default());
    }
}
