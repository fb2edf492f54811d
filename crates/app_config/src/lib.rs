//! Application configuration for Voxpipe
//!
//! One validated [`Settings`] structure composes the sections consumed by
//! the pipeline components at construction time: audio conditioning,
//! transcription, prompt templates and LLM providers.
//!
//! Settings load from `config/settings.toml` (with
//! `config/settings.example.toml` as the out-of-the-box base layer) and are
//! overridden by `VOXPIPE_*` environment variables.

pub mod telemetry;

use std::path::Path;

use refine::{LlmConfig, TemplatesConfig};
use serde::{Deserialize, Serialize};
use speech::{AudioConfig, TranscriptionConfig};
use thiserror::Error;
use tracing::info;

/// Path (without extension) of the operator-provided settings file
const SETTINGS_PATH: &str = "config/settings";

/// Path (without extension) of the shipped example settings
const EXAMPLE_SETTINGS_PATH: &str = "config/settings.example";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "VOXPIPE";

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or deserializing the configuration failed
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    /// The configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The validated settings structure handed to every component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Audio conditioning section
    #[serde(default)]
    pub audio: AudioConfig,

    /// Transcription section
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Prompt template section
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// LLM provider section
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Settings {
    /// Load settings from the default locations and the environment
    ///
    /// Layering, later sources overriding earlier ones: the shipped example
    /// file, the operator's `config/settings.toml`, then `VOXPIPE_*`
    /// environment variables. Both files are optional; every key has a
    /// built-in default.
    pub fn load() -> Result<Self, SettingsError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(EXAMPLE_SETTINGS_PATH).required(false))
            .add_source(config::File::with_name(SETTINGS_PATH).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("_")
                    .try_parsing(true),
            );

        let settings: Self = builder.build()?.try_deserialize()?;

        info!(
            model = %settings.transcription.model,
            provider = %settings.llm.default_provider,
            "Loaded settings"
        );

        Ok(settings)
    }

    /// Load settings from one explicit file, without environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.audio.validate().map_err(SettingsError::Invalid)?;
        self.transcription
            .validate()
            .map_err(SettingsError::Invalid)?;
        self.templates.validate().map_err(SettingsError::Invalid)?;
        self.llm.validate().map_err(SettingsError::Invalid)?;
        Ok(())
    }
}
