//! Audio asset types
//!
//! An [`AudioAsset`] is an opaque reference to audio bytes, either on disk
//! or in memory, plus a format hint used to pick decode behavior. Assets are
//! created by the caller, consumed by the normalizer and transcriber, and
//! never retained by this crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Supported audio container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// WAV format (uncompressed PCM)
    Wav,
    /// MP3 format
    Mp3,
    /// OGG container
    Ogg,
    /// Opus codec
    Opus,
    /// FLAC format (lossless)
    Flac,
    /// WebM format
    Webm,
    /// M4A/AAC format
    M4a,
}

impl AudioFormat {
    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Webm => "webm",
            Self::M4a => "m4a",
        }
    }

    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Opus => "audio/opus",
            Self::Flac => "audio/flac",
            Self::Webm => "audio/webm",
            Self::M4a => "audio/m4a",
        }
    }

    /// Parse an audio format from a file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "ogg" => Some(Self::Ogg),
            "opus" => Some(Self::Opus),
            "flac" => Some(Self::Flac),
            "webm" => Some(Self::Webm),
            "m4a" | "mp4" => Some(Self::M4a),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where the audio bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Audio stored in a file on disk
    File(PathBuf),
    /// Audio held in memory
    Memory(Vec<u8>),
}

/// An audio clip handed through the pipeline
///
/// The pipeline never copies a memory-backed asset to disk on its own
/// behalf (the normalizer spools one only to hand it to ffmpeg).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    source: AudioSource,
    format_hint: Option<AudioFormat>,
}

impl AudioAsset {
    /// Create an asset for a file on disk, inferring the format hint from
    /// the file extension
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format_hint = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension);
        Self {
            source: AudioSource::File(path),
            format_hint,
        }
    }

    /// Create an asset for audio held in memory
    #[must_use]
    pub const fn from_memory(data: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            source: AudioSource::Memory(data),
            format_hint: Some(format),
        }
    }

    /// Get the audio source
    #[must_use]
    pub const fn source(&self) -> &AudioSource {
        &self.source
    }

    /// Get the format hint, if known
    #[must_use]
    pub const fn format_hint(&self) -> Option<AudioFormat> {
        self.format_hint
    }

    /// Get the backing file path, if this asset lives on disk
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            AudioSource::File(path) => Some(path),
            AudioSource::Memory(_) => None,
        }
    }

    /// Get the in-memory bytes, if this asset lives in memory
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.source {
            AudioSource::File(_) => None,
            AudioSource::Memory(data) => Some(data),
        }
    }
}
