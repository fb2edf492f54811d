//! Configuration for audio conditioning and transcription

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the audio normalizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Target channel count
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Whether loudness normalization runs at all
    #[serde(default = "default_true")]
    pub normalize: bool,
}

const fn default_sample_rate() -> u32 {
    16_000
}

const fn default_channels() -> u16 {
    1
}

const fn default_true() -> bool {
    true
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            normalize: default_true(),
        }
    }
}

impl AudioConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("Sample rate must be greater than 0".to_string());
        }
        if self.channels == 0 {
            return Err("Channel count must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Execution device for Whisper inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CPU inference
    #[default]
    Cpu,
    /// CUDA accelerator
    Cuda,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda => f.write_str("cuda"),
        }
    }
}

/// Numeric precision mode for the model weights
///
/// whisper.cpp bakes precision into the GGML file; `Int8` selects the
/// `-q8_0` quantized variant of the model file when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComputePrecision {
    /// 8-bit quantized weights
    #[default]
    Int8,
    /// Half-precision weights
    Float16,
    /// Full-precision weights
    Float32,
}

impl std::fmt::Display for ComputePrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int8 => f.write_str("int8"),
            Self::Float16 => f.write_str("float16"),
            Self::Float32 => f.write_str("float32"),
        }
    }
}

/// Configuration for the transcriber
///
/// Immutable after construction; the model is loaded on the first
/// transcription call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Short model name (`tiny`, `base`, `small`, ...) resolved to
    /// `ggml-<name>.bin` under `models_dir`, or an explicit path to a
    /// GGML model file
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory searched for GGML model files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Execution device
    #[serde(default)]
    pub device: Device,

    /// Numeric precision mode
    #[serde(default)]
    pub compute_type: ComputePrecision,

    /// ISO 639-1 language code, or `"auto"` to let the model detect it
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_model() -> String {
    "small".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            models_dir: default_models_dir(),
            device: Device::default(),
            compute_type: ComputePrecision::default(),
            language: default_language(),
        }
    }
}

impl TranscriptionConfig {
    /// The sentinel language value that enables auto-detection
    pub const AUTO_LANGUAGE: &'static str = "auto";

    /// Whether language auto-detection is requested
    #[must_use]
    pub fn detect_language(&self) -> bool {
        self.language == Self::AUTO_LANGUAGE
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model must not be empty".to_string());
        }
        if self.language.trim().is_empty() {
            return Err("Language must not be empty (use \"auto\" to detect)".to_string());
        }
        Ok(())
    }
}
