//! OpenAI-compatible chat completions client
//!
//! Serves two providers: OpenAI itself, and a local Ollama server exposed
//! through its OpenAI-compatible endpoint at `{base_url}/v1` with a
//! placeholder credential the backend ignores.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{OllamaConfig, OpenAiConfig, ProviderKind};
use crate::error::RefineError;
use crate::ports::{CompletionBackend, CompletionRequest};

/// Environment variable consulted when the config carries no key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Placeholder credential sent to Ollama; required by the wire format,
/// ignored by the server
const OLLAMA_PLACEHOLDER_KEY: &str = "ollama";

/// Client for an OpenAI-compatible chat completions endpoint
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client for OpenAI, resolving the credential from config or
    /// environment
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::MissingCredential`] when no key is available
    /// and [`RefineError::ConnectionFailed`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, RefineError> {
        let api_key = super::resolve_credential(
            ProviderKind::OpenAi,
            config.api_key.as_ref(),
            API_KEY_ENV,
        )?;
        Self::build(config.base_url.clone(), api_key)
    }

    /// Create a client for a local Ollama server
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::ConnectionFailed`] when the HTTP client
    /// cannot be built.
    pub fn for_ollama(config: &OllamaConfig) -> Result<Self, RefineError> {
        let base_url = format!("{}/v1", config.base_url.trim_end_matches('/'));
        Self::build(
            base_url,
            SecretString::from(OLLAMA_PLACEHOLDER_KEY.to_string()),
        )
    }

    fn build(base_url: String, api_key: SecretString) -> Result<Self, RefineError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RefineError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RefineError> {
        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!(url = %self.chat_url(), "Sending chat completion request");

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat completion request failed");
            return Err(RefineError::ServerError(format!("Status {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| RefineError::InvalidResponse(e.to_string()))?;

        // Only the first choice is used; any trailing choices are discarded.
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                RefineError::InvalidResponse("response contained no completion choices".to_string())
            })
    }
}
