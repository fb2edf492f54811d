//! The refinement provider router
//!
//! Renders the prompt, resolves the target provider, and dispatches to a
//! lazily constructed, per-provider client. Clients are built at most once
//! per router instance; a failed construction is surfaced on every call and
//! never cached, so a recreated router gets a clean retry.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, instrument};

use crate::config::{LlmConfig, ProviderKind, TemplatesConfig};
use crate::error::RefineError;
use crate::ports::{CompletionBackend, CompletionRequest};
use crate::providers::{AnthropicClient, OpenAiClient};
use crate::templates::PromptLibrary;

/// Multi-provider text refinement router
pub struct Refiner {
    config: LlmConfig,
    prompts: PromptLibrary,
    default_template: String,
    anthropic: RwLock<Option<Arc<AnthropicClient>>>,
    openai: RwLock<Option<Arc<OpenAiClient>>>,
    ollama: RwLock<Option<Arc<OpenAiClient>>>,
}

impl std::fmt::Debug for Refiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refiner")
            .field("default_provider", &self.config.default_provider)
            .field("default_template", &self.default_template)
            .finish_non_exhaustive()
    }
}

impl Refiner {
    /// Create a router over the given provider and template configuration
    #[must_use]
    pub fn new(config: LlmConfig, templates: TemplatesConfig) -> Self {
        let prompts = PromptLibrary::new(&templates);
        Self {
            config,
            prompts,
            default_template: templates.default,
            anthropic: RwLock::new(None),
            openai: RwLock::new(None),
            ollama: RwLock::new(None),
        }
    }

    /// Access the prompt library
    #[must_use]
    pub const fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// The template used by [`Refiner::refine_default`]
    #[must_use]
    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    /// Refine text with the configured default template and provider
    pub async fn refine_default(&self, text: &str) -> Result<String, RefineError> {
        let template = self.default_template.clone();
        self.refine(text, &template, None).await
    }

    /// Refine text using a named prompt template and an optional provider
    /// override
    ///
    /// Renders the template with `text` bound, resolves the provider
    /// (explicit argument, else the configured default), and returns the
    /// first completion's text.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError`]: template failures, configuration failures
    /// (unconfigured provider, missing credential) and provider call
    /// failures, all without internal retry.
    #[instrument(skip(self, text), fields(template = %template_name))]
    pub async fn refine(
        &self,
        text: &str,
        template_name: &str,
        provider: Option<ProviderKind>,
    ) -> Result<String, RefineError> {
        let prompt = self.prompts.render_text(template_name, text)?;

        let kind = provider.unwrap_or(self.config.default_provider);

        info!(provider = %kind, "Refining text");

        match kind {
            ProviderKind::Anthropic => {
                let section = self
                    .config
                    .anthropic
                    .as_ref()
                    .ok_or(RefineError::ProviderNotConfigured(kind))?;
                let client = cached_client(&self.anthropic, || {
                    AnthropicClient::new(section.clone())
                })?;
                let request = CompletionRequest::new(section.model.clone(), prompt)
                    .with_max_tokens(section.max_tokens);
                client.complete(&request).await
            }
            ProviderKind::OpenAi => {
                let section = self
                    .config
                    .openai
                    .as_ref()
                    .ok_or(RefineError::ProviderNotConfigured(kind))?;
                let client = cached_client(&self.openai, || OpenAiClient::new(section))?;
                let request = CompletionRequest::new(section.model.clone(), prompt)
                    .with_max_tokens(section.max_tokens);
                client.complete(&request).await
            }
            ProviderKind::Ollama => {
                let section = self
                    .config
                    .ollama
                    .as_ref()
                    .ok_or(RefineError::ProviderNotConfigured(kind))?;
                let client = cached_client(&self.ollama, || OpenAiClient::for_ollama(section))?;
                // Ollama treats the token limit as best-effort; omit it.
                let request = CompletionRequest::new(section.model.clone(), prompt);
                client.complete(&request).await
            }
        }
    }
}

/// Return the cached client, constructing and publishing it on first use
///
/// Construction runs outside the lock; when two callers race, the first
/// published client wins and the duplicate is dropped. Errors are returned
/// to the caller and never stored.
fn cached_client<T, F>(slot: &RwLock<Option<Arc<T>>>, build: F) -> Result<Arc<T>, RefineError>
where
    F: FnOnce() -> Result<T, RefineError>,
{
    if let Some(client) = slot.read().as_ref() {
        return Ok(Arc::clone(client));
    }

    let built = Arc::new(build()?);

    let mut guard = slot.write();
    Ok(Arc::clone(guard.get_or_insert(built)))
}
