//! Workspace configuration for NavBuddy

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory (under the project root) holding NavBuddy's files
pub const CONFIG_DIR: &str = ".navbuddy";

/// Configuration for a project being navigated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// File extensions scanned for comments
    #[serde(default = "default_include_extensions")]
    pub include_extensions: Vec<String>,

    /// Directory names never descended into (dependency caches)
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Number of files read concurrently per scan batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of comments sent to the model per query
    #[serde(default = "default_max_prompt_comments")]
    pub max_prompt_comments: usize,

    /// Characters of comment text kept per prompt line
    #[serde(default = "default_comment_preview_chars")]
    pub comment_preview_chars: usize,

    /// Upper bound on filename-only resolution candidates
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// LLM endpoint configuration
    #[serde(default)]
    pub llm: LlmSettings,
}

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API endpoint URL (OpenAI-compatible, or Ollama on port 11434)
    pub endpoint: Option<String>,

    /// Model name to use
    pub model: Option<String>,

    /// API key (if required)
    pub api_key: Option<String>,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cut-off
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_include_extensions() -> Vec<String> {
    [
        "js", "jsx", "ts", "tsx", "mjs", "cjs", "rs", "go", "java", "kt", "swift", "c", "h",
        "cc", "cpp", "hpp", "cs",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["node_modules".to_string(), ".git".to_string()]
}

fn default_batch_size() -> usize {
    20
}

fn default_max_prompt_comments() -> usize {
    25
}

fn default_comment_preview_chars() -> usize {
    80
}

fn default_max_candidates() -> usize {
    10
}

fn default_max_tokens() -> usize {
    600
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    1.0
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            include_extensions: default_include_extensions(),
            exclude_dirs: default_exclude_dirs(),
            batch_size: default_batch_size(),
            max_prompt_comments: default_max_prompt_comments(),
            comment_preview_chars: default_comment_preview_chars(),
            max_candidates: default_max_candidates(),
            llm: LlmSettings::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Path of the config file for a project root
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join("config.toml")
    }

    /// Load configuration from the project or return defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = Self::path_for(root);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: WorkspaceConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the project
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let config_path = Self::path_for(root);
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Check if a file name carries one of the scanned extensions
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.include_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Check if a directory name is excluded from walks
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }
}
