//! Port definitions for completion backends
//!
//! A backend receives one rendered prompt and returns one completion; the
//! provider clients in `providers` are the adapters.

use async_trait::async_trait;

use crate::error::RefineError;

/// A single chat-style completion request
///
/// Carries exactly one user-role message (the rendered prompt). The token
/// limit is provider-specific: honored by Anthropic and OpenAI, best-effort
/// or ignored by Ollama (which is why it is optional here).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier to run
    pub model: String,
    /// The rendered prompt, sent as the sole user message
    pub prompt: String,
    /// Maximum output tokens, where the backend honors it
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request for a prompt and model
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: None,
        }
    }

    /// Set the output-token limit
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Port for completion backend implementations
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Execute the request and return the first completion's text
    ///
    /// Additional completions, if the backend returns any, are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError`] on transport, server or decoding failures.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RefineError>;
}
