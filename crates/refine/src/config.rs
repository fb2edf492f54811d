//! Configuration for templates and LLM providers

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::RefineError;

/// The closed set of refinement providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic messages API (remote, credentialed)
    Anthropic,
    /// OpenAI chat completions API (remote, credentialed)
    OpenAi,
    /// Local Ollama server speaking the OpenAI-compatible API
    Ollama,
}

impl ProviderKind {
    /// Stable lowercase name used in configuration and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = RefineError;

    /// Parse a provider name; this is the runtime boundary where
    /// string-typed callers meet the closed provider set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(RefineError::UnknownProvider(other.to_string())),
        }
    }
}

/// Anthropic provider section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Model identifier
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum output tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API base URL (overridable for tests and proxies)
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// API key (sensitive - uses SecretString); falls back to the
    /// `ANTHROPIC_API_KEY` environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

const fn default_max_tokens() -> u32 {
    1024
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            base_url: default_anthropic_base_url(),
            api_key: None,
        }
    }
}

/// OpenAI provider section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Model identifier
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Maximum output tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API base URL (overridable for tests and proxies)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// API key (sensitive - uses SecretString); falls back to the
    /// `OPENAI_API_KEY` environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            base_url: default_openai_base_url(),
            api_key: None,
        }
    }
}

/// Ollama provider section
///
/// Ollama requires no credential; the client speaks the OpenAI-compatible
/// API rooted at `{base_url}/v1` and the output-token limit is best-effort
/// on the server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base endpoint of the Ollama server
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

/// LLM refinement configuration
///
/// Exactly one provider is the default; the per-provider sections are
/// optional and selecting an absent one is a configuration error at call
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,

    /// Anthropic section
    #[serde(default)]
    pub anthropic: Option<AnthropicConfig>,

    /// OpenAI section
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,

    /// Ollama section
    #[serde(default)]
    pub ollama: Option<OllamaConfig>,
}

const fn default_provider() -> ProviderKind {
    ProviderKind::Ollama
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            anthropic: None,
            openai: None,
            ollama: Some(OllamaConfig::default()),
        }
    }
}

impl LlmConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(anthropic) = &self.anthropic {
            if anthropic.model.trim().is_empty() {
                return Err("Anthropic model must not be empty".to_string());
            }
            if anthropic.max_tokens == 0 {
                return Err("Anthropic max_tokens must be greater than 0".to_string());
            }
        }
        if let Some(openai) = &self.openai {
            if openai.model.trim().is_empty() {
                return Err("OpenAI model must not be empty".to_string());
            }
            if openai.max_tokens == 0 {
                return Err("OpenAI max_tokens must be greater than 0".to_string());
            }
        }
        if let Some(ollama) = &self.ollama {
            if ollama.base_url.trim().is_empty() {
                return Err("Ollama base_url must not be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding one `.tera` file per template
    #[serde(default = "default_templates_dir")]
    pub directory: PathBuf,

    /// Template used when a request does not name one
    #[serde(default = "default_template")]
    pub default: String,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./prompts")
}

fn default_template() -> String {
    "fix_grammar".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: default_templates_dir(),
            default: default_template(),
        }
    }
}

impl TemplatesConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.default.trim().is_empty() {
            return Err("Default template must not be empty".to_string());
        }
        Ok(())
    }
}
