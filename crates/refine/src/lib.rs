//! Refine - Template-driven LLM text refinement
//!
//! The async half of the Voxpipe pipeline:
//! - `PromptLibrary` - render named prompt templates from a configured
//!   directory
//! - `Refiner` - dispatch a rendered prompt to one of the interchangeable
//!   LLM providers and return the completion text
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` defines the completion request and the backend trait
//! - `providers` contains the concrete HTTP clients
//!
//! Providers form a closed set ([`ProviderKind`]); an unrecognized name is
//! rejected at the string-parsing boundary rather than falling through a
//! match at dispatch time. Clients are constructed lazily, at most once per
//! provider per [`Refiner`], and a construction failure is surfaced on
//! every call rather than cached as success.
//!
//! # Example
//!
//! ```ignore
//! use refine::{LlmConfig, ProviderKind, Refiner, TemplatesConfig};
//!
//! let refiner = Refiner::new(LlmConfig::default(), TemplatesConfig::default());
//! let refined = refiner
//!     .refine("i goed home", "fix_grammar", Some(ProviderKind::Ollama))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod refiner;
pub mod templates;

pub use config::{
    AnthropicConfig, LlmConfig, OllamaConfig, OpenAiConfig, ProviderKind, TemplatesConfig,
};
pub use error::RefineError;
pub use ports::{CompletionBackend, CompletionRequest};
pub use refiner::Refiner;
pub use templates::{PromptLibrary, TemplateContext, TemplateError};
