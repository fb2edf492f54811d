//! Audio loudness normalization via ffmpeg
//!
//! Resamples to the configured rate, downmixes to mono and applies EBU R128
//! loudness normalization before transcription. Normalization is strictly
//! best-effort: when it is disabled, the tool is missing, or the tool fails,
//! the original asset is returned and the pipeline continues.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error, info, warn};

use crate::config::AudioConfig;
use crate::types::{AudioAsset, AudioSource};

/// Loudness filter for speech: integrated -16 LUFS, true peak -1.5 dBTP,
/// loudness range 11 LU
const LOUDNORM_FILTER: &str = "loudnorm=I=-16:TP=-1.5:LRA=11";

/// Suffix appended to normalized file artifacts
const OUTPUT_EXTENSION: &str = "norm.wav";

/// Audio normalizer wrapping the system ffmpeg binary
///
/// Tool availability is probed once at construction; each `normalize` call
/// on an unavailable tool logs a warning and returns the input unchanged.
/// Any file artifact this component creates is the caller's to discard.
#[derive(Debug, Clone)]
pub struct Normalizer {
    enabled: bool,
    sample_rate: u32,
    channels: u16,
    ffmpeg_path: Option<String>,
    tool_available: bool,
}

impl Normalizer {
    /// Create a normalizer using `ffmpeg` from the PATH
    #[must_use]
    pub fn new(config: &AudioConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a normalizer with a custom ffmpeg binary path
    #[must_use]
    pub fn with_ffmpeg_path(config: &AudioConfig, path: impl Into<String>) -> Self {
        Self::build(config, Some(path.into()))
    }

    fn build(config: &AudioConfig, ffmpeg_path: Option<String>) -> Self {
        let mut normalizer = Self {
            enabled: config.normalize,
            sample_rate: config.sample_rate,
            channels: config.channels,
            ffmpeg_path,
            tool_available: false,
        };
        normalizer.tool_available = normalizer.probe_tool();
        normalizer
    }

    fn ffmpeg_path(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or("ffmpeg")
    }

    /// Whether the ffmpeg binary answered the version probe
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.tool_available
    }

    fn probe_tool(&self) -> bool {
        Command::new(self.ffmpeg_path())
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    /// Normalize an asset, falling back to the input on any failure
    ///
    /// Returns a new asset pointing at the normalized audio, or the input
    /// unchanged when normalization is disabled, the tool is missing, or
    /// the tool fails.
    #[must_use]
    pub fn normalize(&self, asset: AudioAsset) -> AudioAsset {
        if !self.enabled {
            return asset;
        }

        if !self.tool_available {
            warn!(
                ffmpeg = %self.ffmpeg_path(),
                "Normalization enabled but ffmpeg not found, skipping"
            );
            return asset;
        }

        match asset.source() {
            AudioSource::File(_) => self.normalize_file(asset),
            AudioSource::Memory(_) => self.normalize_memory(asset),
        }
    }

    fn normalize_file(&self, original: AudioAsset) -> AudioAsset {
        let Some(input) = original.path().map(Path::to_path_buf) else {
            return original;
        };
        let output = input.with_extension(OUTPUT_EXTENSION);

        info!(input = %input.display(), "Normalizing audio");

        match self.run_ffmpeg(&input, &output) {
            Ok(()) => {
                info!(output = %output.display(), "Normalization complete");
                AudioAsset::from_file(output)
            }
            Err(diagnostics) => {
                error!(stderr = %diagnostics, "ffmpeg normalization failed");
                original
            }
        }
    }

    /// Spool in-memory audio through a temp file, returning the normalized
    /// bytes as a new memory asset
    fn normalize_memory(&self, original: AudioAsset) -> AudioAsset {
        let extension = original
            .format_hint()
            .map_or("bin", |format| format.extension());

        let spooled = match spool_to_temp(original.bytes().unwrap_or_default(), extension) {
            Ok(file) => file,
            Err(e) => {
                error!(error = %e, "Failed to spool audio for normalization");
                return original;
            }
        };

        let output = spooled.path().with_extension(OUTPUT_EXTENSION);

        debug!(input = %spooled.path().display(), "Normalizing spooled audio");

        let result = self.run_ffmpeg(spooled.path(), &output);
        // The spooled input is removed on drop; the output is ours to clean.
        match result.and_then(|()| {
            std::fs::read(&output).map_err(|e| format!("failed to read normalized output: {e}"))
        }) {
            Ok(bytes) => {
                let _ = std::fs::remove_file(&output);
                info!(size = bytes.len(), "Normalization complete");
                AudioAsset::from_memory(bytes, crate::types::AudioFormat::Wav)
            }
            Err(diagnostics) => {
                let _ = std::fs::remove_file(&output);
                error!(stderr = %diagnostics, "ffmpeg normalization failed");
                original
            }
        }
    }

    fn run_ffmpeg(&self, input: &Path, output: &Path) -> Result<(), String> {
        let result = Command::new(self.ffmpeg_path())
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(LOUDNORM_FILTER)
            .arg("-ar")
            .arg(self.sample_rate.to_string())
            .arg("-ac")
            .arg(self.channels.to_string())
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let out = result.map_err(|e| format!("failed to run ffmpeg: {e}"))?;

        if !out.status.success() {
            return Err(String::from_utf8_lossy(&out.stderr).trim().to_string());
        }

        // A zero exit without the output artifact is still a failure.
        if !output.exists() {
            return Err(format!(
                "ffmpeg exited successfully but produced no output at {}",
                output.display()
            ));
        }

        Ok(())
    }
}

fn spool_to_temp(data: &[u8], extension: &str) -> Result<tempfile::NamedTempFile, String> {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .prefix("voxpipe-audio-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(|e| format!("failed to create temp file: {e}"))?;
    file.write_all(data)
        .map_err(|e| format!("failed to write temp file: {e}"))?;
    file.flush()
        .map_err(|e| format!("failed to flush temp file: {e}"))?;
    Ok(file)
}
