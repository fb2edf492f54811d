//! Speech processing errors

use thiserror::Error;

/// Errors that can occur during transcription
///
/// Normalization failures never appear here: the normalizer degrades to the
/// original asset and logs instead of failing the pipeline.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Model file or runtime not present on this machine
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The model file exists but could not be loaded
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Inference failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// The audio could not be decoded
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),
}
