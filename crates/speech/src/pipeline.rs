//! The canonical normalize-then-transcribe composition
//!
//! Normalization always runs ahead of transcription when enabled; there is
//! no format- or extension-based skip. The normalizer degrades silently,
//! so the only failures surfacing from [`SpeechPipeline::transcribe`] are
//! the transcriber's own.

use std::sync::Arc;

use crate::config::{AudioConfig, TranscriptionConfig};
use crate::error::SpeechError;
use crate::normalizer::Normalizer;
use crate::transcriber::{SttEngine, Transcriber};
use crate::types::AudioAsset;

/// Audio-to-text pipeline: condition with ffmpeg, then run Whisper
#[derive(Debug)]
pub struct SpeechPipeline {
    normalizer: Normalizer,
    transcriber: Transcriber,
}

impl SpeechPipeline {
    /// Build the pipeline from validated settings
    #[must_use]
    pub fn new(audio: &AudioConfig, transcription: TranscriptionConfig) -> Self {
        Self {
            normalizer: Normalizer::new(audio),
            transcriber: Transcriber::new(transcription),
        }
    }

    /// Build the pipeline around preconstructed components
    #[must_use]
    pub fn with_components(normalizer: Normalizer, transcriber: Transcriber) -> Self {
        Self {
            normalizer,
            transcriber,
        }
    }

    /// Access the normalizer
    #[must_use]
    pub const fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Access the transcriber
    #[must_use]
    pub const fn transcriber(&self) -> &Transcriber {
        &self.transcriber
    }

    /// Normalize the asset and transcribe it to text
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError`] when transcription fails; normalization
    /// failures degrade to the original asset instead of erroring.
    pub fn transcribe(&self, asset: AudioAsset) -> Result<String, SpeechError> {
        let conditioned = self.normalizer.normalize(asset);
        self.transcriber.transcribe(&conditioned)
    }
}

/// Convenience constructor used by services that inject a custom engine
impl SpeechPipeline {
    /// Build the pipeline with an externally constructed speech engine
    #[must_use]
    pub fn with_engine(
        audio: &AudioConfig,
        transcription: TranscriptionConfig,
        engine: Arc<dyn SttEngine>,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(audio),
            transcriber: Transcriber::with_engine(transcription, engine),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::transcriber::{RawTranscription, Segment};
    use crate::types::AudioFormat;

    struct FixedEngine;

    impl SttEngine for FixedEngine {
        fn run(
            &self,
            _samples: &[f32],
            _language: Option<&str>,
        ) -> Result<RawTranscription, SpeechError> {
            Ok(RawTranscription {
                segments: vec![
                    Segment {
                        text: " Hello".to_string(),
                        start_ms: 0,
                        end_ms: 500,
                    },
                    Segment {
                        text: " world".to_string(),
                        start_ms: 500,
                        end_ms: 900,
                    },
                ],
                language: Some("en".to_string()),
                confidence: Some(0.8),
            })
        }
    }

    fn wav_asset() -> AudioAsset {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..160 {
                writer.write_sample(0_i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        AudioAsset::from_memory(cursor.into_inner(), AudioFormat::Wav)
    }

    #[test]
    fn transcribes_through_disabled_normalizer() {
        let audio = AudioConfig {
            normalize: false,
            ..AudioConfig::default()
        };
        let pipeline = SpeechPipeline::with_engine(
            &audio,
            TranscriptionConfig::default(),
            Arc::new(FixedEngine),
        );

        let text = pipeline.transcribe(wav_asset()).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn missing_tool_degrades_but_still_transcribes() {
        let audio = AudioConfig::default();
        let normalizer = Normalizer::with_ffmpeg_path(&audio, "/nonexistent/ffmpeg");
        let transcriber =
            Transcriber::with_engine(TranscriptionConfig::default(), Arc::new(FixedEngine));
        let pipeline = SpeechPipeline::with_components(normalizer, transcriber);

        let text = pipeline.transcribe(wav_asset()).unwrap();
        assert_eq!(text, "Hello world");
    }
}
