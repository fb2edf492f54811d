//! Anthropic messages API client

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{AnthropicConfig, ProviderKind};
use crate::error::RefineError;
use crate::ports::{CompletionBackend, CompletionRequest};

/// Environment variable consulted when the config carries no key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// API version header required by the messages endpoint
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic messages API
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
    api_key: SecretString,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a client, resolving the credential from config or environment
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::MissingCredential`] when no key is available
    /// and [`RefineError::ConnectionFailed`] when the HTTP client cannot be
    /// built.
    pub fn new(config: AnthropicConfig) -> Result<Self, RefineError> {
        let api_key = super::resolve_credential(
            ProviderKind::Anthropic,
            config.api_key.as_ref(),
            API_KEY_ENV,
        )?;

        let client = Client::builder()
            .build()
            .map_err(|e| RefineError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

/// Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Messages API response body
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl CompletionBackend for AnthropicClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RefineError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            messages: vec![RequestMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!("Sending messages request to Anthropic");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Anthropic request failed");
            return Err(RefineError::ServerError(format!("Status {status}: {body}")));
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| RefineError::InvalidResponse(e.to_string()))?;

        // Only the first block is used; any trailing blocks are discarded.
        messages
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| {
                RefineError::InvalidResponse("response contained no text block".to_string())
            })
    }
}
