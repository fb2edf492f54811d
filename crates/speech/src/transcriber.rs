//! Whisper transcription with a lazily loaded model
//!
//! [`Transcriber`] owns at most one loaded model for its lifetime. The model
//! loads on the first `transcribe` call and is then reused; a load failure
//! is returned to the caller and never published, so a later call retries a
//! clean load. Call-site inference errors do not invalidate the handle.
//!
//! The whisper context is read-only after loading and a fresh decoding
//! state is created per call, so concurrent transcriptions need no lock
//! beyond the publish guard.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::{ComputePrecision, Device, TranscriptionConfig};
use crate::error::SpeechError;
use crate::pcm;
use crate::types::AudioAsset;

/// Fixed beam width for decoding
const BEAM_SIZE: i32 = 5;

/// A single time-aligned text chunk produced by the model
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment text as emitted by the model
    pub text: String,
    /// Start offset in milliseconds
    pub start_ms: u64,
    /// End offset in milliseconds
    pub end_ms: u64,
}

/// Raw engine output: ordered segments plus the detection side channel
#[derive(Debug, Clone, Default)]
pub struct RawTranscription {
    /// Time-aligned segments in playback order
    pub segments: Vec<Segment>,
    /// Detected (or confirmed) language code
    pub language: Option<String>,
    /// Mean decoder token probability for the run
    pub confidence: Option<f32>,
}

/// Object-safe interface over a loaded speech model
///
/// `samples` must be 16 kHz mono `f32` PCM. `language` is an explicit ISO
/// 639-1 code, or `None` to let the model detect the language.
pub trait SttEngine: Send + Sync {
    /// Run inference over the full clip
    fn run(&self, samples: &[f32], language: Option<&str>)
        -> Result<RawTranscription, SpeechError>;
}

/// Speech-to-text transcriber over a lazily loaded Whisper model
pub struct Transcriber {
    config: TranscriptionConfig,
    engine: RwLock<Option<Arc<dyn SttEngine>>>,
}

impl std::fmt::Debug for Transcriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcriber")
            .field("config", &self.config)
            .field("loaded", &self.engine.read().is_some())
            .finish_non_exhaustive()
    }
}

impl Transcriber {
    /// Create a transcriber; the model is not loaded until the first call
    #[must_use]
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            config,
            engine: RwLock::new(None),
        }
    }

    /// Create a transcriber around an already constructed engine
    ///
    /// Primarily a seam for tests and alternative runtimes.
    #[must_use]
    pub fn with_engine(config: TranscriptionConfig, engine: Arc<dyn SttEngine>) -> Self {
        Self {
            config,
            engine: RwLock::new(Some(engine)),
        }
    }

    /// Whether the model has been loaded yet
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Transcribe an asset to text
    ///
    /// Segment texts are joined with single spaces and the result is
    /// trimmed. The detected language and its confidence signal are logged,
    /// not returned.
    ///
    /// # Errors
    ///
    /// - [`SpeechError::ModelNotAvailable`] / [`SpeechError::ModelLoad`]
    ///   when the first call cannot load the model
    /// - [`SpeechError::InvalidAudio`] when the asset cannot be decoded
    /// - [`SpeechError::Transcription`] when inference fails
    #[instrument(skip(self, asset), fields(model = %self.config.model))]
    pub fn transcribe(&self, asset: &AudioAsset) -> Result<String, SpeechError> {
        let engine = self.engine()?;

        info!("Transcribing audio asset");

        let samples = pcm::read_asset(asset)?;

        let language = if self.config.detect_language() {
            None
        } else {
            Some(self.config.language.as_str())
        };

        let raw = engine.run(&samples, language)?;

        if let Some(detected) = &raw.language {
            info!(
                language = %detected,
                confidence = raw.confidence.unwrap_or(0.0),
                "Detected language"
            );
        }

        Ok(join_segments(&raw.segments))
    }

    /// Get the loaded engine, loading and publishing it on first use
    ///
    /// Construction happens outside the lock; a racing loader's duplicate
    /// is dropped in favor of the first published handle. Failures are
    /// returned, never cached.
    fn engine(&self) -> Result<Arc<dyn SttEngine>, SpeechError> {
        if let Some(engine) = self.engine.read().as_ref() {
            return Ok(Arc::clone(engine));
        }

        let loaded: Arc<dyn SttEngine> = Arc::new(WhisperEngine::load(&self.config)?);

        let mut slot = self.engine.write();
        Ok(Arc::clone(slot.get_or_insert(loaded)))
    }
}

/// Join segment texts with single spaces, dropping empty segments
fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the configured model identifier to a GGML file on disk
///
/// An identifier containing a path separator or a `.bin` suffix is used as
/// an explicit path; otherwise it is a short name looked up under
/// `models_dir`, preferring the `-q8_0` quantized file for int8 precision.
fn resolve_model_path(config: &TranscriptionConfig) -> Result<PathBuf, SpeechError> {
    let model = config.model.as_str();

    if model.contains(std::path::MAIN_SEPARATOR) || model.ends_with(".bin") {
        let path = PathBuf::from(model);
        if path.exists() {
            return Ok(path);
        }
        return Err(SpeechError::ModelNotAvailable(path.display().to_string()));
    }

    let mut candidates = Vec::new();
    if config.compute_type == ComputePrecision::Int8 {
        candidates.push(config.models_dir.join(format!("ggml-{model}-q8_0.bin")));
    }
    candidates.push(config.models_dir.join(format!("ggml-{model}.bin")));

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }

    let searched = candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(SpeechError::ModelNotAvailable(searched))
}

/// Number of CPU threads handed to whisper, capped at 8
fn optimal_threads() -> i32 {
    std::thread::available_parallelism().map_or(4, |n| n.get().min(8) as i32)
}

/// Production engine wrapping a `whisper_rs::WhisperContext`
///
/// The context holds the loaded weights for the process lifetime; a new
/// `WhisperState` is created per call.
struct WhisperEngine {
    ctx: WhisperContext,
    threads: i32,
}

impl WhisperEngine {
    fn load(config: &TranscriptionConfig) -> Result<Self, SpeechError> {
        let path = resolve_model_path(config)?;
        let path_str = path.to_str().ok_or_else(|| {
            SpeechError::ModelNotAvailable(format!(
                "model path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        info!(
            model = %path.display(),
            device = %config.device,
            compute_type = %config.compute_type,
            "Loading Whisper model"
        );

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(config.device == Device::Cuda);

        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SpeechError::ModelLoad(e.to_string()))?;

        info!("Model loaded");

        Ok(Self {
            ctx,
            threads: optimal_threads(),
        })
    }
}

impl SttEngine for WhisperEngine {
    fn run(
        &self,
        samples: &[f32],
        language: Option<&str>,
    ) -> Result<RawTranscription, SpeechError> {
        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: BEAM_SIZE,
            patience: -1.0,
        });
        params.set_language(language);
        params.set_n_threads(self.threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;

        state
            .full(params, samples)
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SpeechError::Transcription(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        let mut prob_sum = 0.0_f32;
        let mut token_count = 0_u32;

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SpeechError::Transcription(format!("segment {i}: {e}")))?;

            // Timestamps arrive in centiseconds.
            let start_ms = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let end_ms = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            let n_tokens = state.full_n_tokens(i).unwrap_or(0);
            for t in 0..n_tokens {
                if let Ok(prob) = state.full_get_token_prob(i, t) {
                    prob_sum += prob;
                    token_count += 1;
                }
            }

            segments.push(Segment {
                text,
                start_ms,
                end_ms,
            });
        }

        let language = match state.full_lang_id_from_state() {
            Ok(id) => whisper_rs::get_lang_str(id).map(ToString::to_string),
            Err(e) => {
                debug!(error = %e, "Language id unavailable");
                None
            }
        };

        if segments.is_empty() {
            warn!("Model returned no segments");
        }

        let confidence = (token_count > 0).then(|| prob_sum / token_count as f32);

        Ok(RawTranscription {
            segments,
            language,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::types::AudioFormat;

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

    /// Test engine recording the language it was invoked with
    struct MockEngine {
        response: Result<RawTranscription, String>,
        seen_language: Mutex<Option<Option<String>>>,
        calls: AtomicUsize,
    }

    impl MockEngine {
        fn ok(segments: &[&str]) -> Self {
            Self {
                response: Ok(RawTranscription {
                    segments: segments
                        .iter()
                        .map(|text| Segment {
                            text: (*text).to_string(),
                            start_ms: 0,
                            end_ms: 0,
                        })
                        .collect(),
                    language: Some("en".to_string()),
                    confidence: Some(0.9),
                }),
                seen_language: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        fn err(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen_language: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SttEngine for MockEngine {
        fn run(
            &self,
            samples: &[f32],
            language: Option<&str>,
        ) -> Result<RawTranscription, SpeechError> {
            assert!(!samples.is_empty(), "engine must receive decoded samples");
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_language.lock() = Some(language.map(ToString::to_string));
            self.response
                .clone()
                .map_err(SpeechError::Transcription)
        }
    }

    fn transcriber_with(engine: Arc<MockEngine>, language: &str) -> Transcriber {
        let config = TranscriptionConfig {
            language: language.to_string(),
            ..Default::default()
        };
        Transcriber::with_engine(config, engine)
    }

    // === join_segments ===

    #[test]
    fn joins_segments_with_single_spaces() {
        let engine = Arc::new(MockEngine::ok(&["Hello", "world"]));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        let text = transcriber.transcribe(&wav_asset()).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn trims_segment_whitespace() {
        let engine = Arc::new(MockEngine::ok(&[" Hello,", " how are you? ", ""]));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        let text = transcriber.transcribe(&wav_asset()).unwrap();
        assert_eq!(text, "Hello, how are you?");
    }

    #[test]
    fn empty_segments_yield_empty_text() {
        let engine = Arc::new(MockEngine::ok(&[]));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        assert_eq!(transcriber.transcribe(&wav_asset()).unwrap(), "");
    }

    // === language handling ===

    #[test]
    fn auto_language_invokes_detection() {
        let engine = Arc::new(MockEngine::ok(&["hallo"]));
        let transcriber = transcriber_with(Arc::clone(&engine), "auto");

        transcriber.transcribe(&wav_asset()).unwrap();
        assert_eq!(*engine.seen_language.lock(), Some(None));
    }

    #[test]
    fn explicit_language_is_forwarded() {
        let engine = Arc::new(MockEngine::ok(&["hallo"]));
        let transcriber = transcriber_with(Arc::clone(&engine), "de");

        transcriber.transcribe(&wav_asset()).unwrap();
        assert_eq!(*engine.seen_language.lock(), Some(Some("de".to_string())));
    }

    // === failure isolation ===

    #[test]
    fn inference_error_propagates_unchanged() {
        let engine = Arc::new(MockEngine::err("beam search exploded"));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        let err = transcriber.transcribe(&wav_asset()).unwrap_err();
        assert!(matches!(err, SpeechError::Transcription(_)));
        assert!(err.to_string().contains("beam search exploded"));
    }

    #[test]
    fn failure_does_not_invalidate_engine() {
        let engine = Arc::new(MockEngine::err("transient"));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        let _ = transcriber.transcribe(&wav_asset());
        let _ = transcriber.transcribe(&wav_asset());

        // Same handle served both calls.
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert!(transcriber.is_loaded());
    }

    #[test]
    fn invalid_audio_reported_before_inference() {
        let engine = Arc::new(MockEngine::ok(&["never"]));
        let transcriber = transcriber_with(Arc::clone(&engine), "en");

        let asset = AudioAsset::from_memory(vec![1, 2, 3], AudioFormat::Wav);
        let err = transcriber.transcribe(&asset).unwrap_err();
        assert!(matches!(err, SpeechError::InvalidAudio(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    // === lazy loading ===

    #[test]
    fn missing_model_is_fatal_and_not_cached() {
        let config = TranscriptionConfig {
            model: "nonexistent".to_string(),
            models_dir: PathBuf::from("/nonexistent-models"),
            ..Default::default()
        };
        let transcriber = Transcriber::new(config);

        let err = transcriber.transcribe(&wav_asset()).unwrap_err();
        assert!(matches!(err, SpeechError::ModelNotAvailable(_)));
        assert!(!transcriber.is_loaded());
    }

    // === model path resolution ===

    fn touch(path: &std::path::Path) {
        std::fs::write(path, b"ggml").unwrap();
    }

    #[test]
    fn explicit_path_must_exist() {
        let config = TranscriptionConfig {
            model: "/nonexistent/ggml-small.bin".to_string(),
            ..Default::default()
        };
        let err = resolve_model_path(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ggml-small.bin"));
    }

    #[test]
    fn explicit_path_is_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("custom.bin");
        touch(&model);

        let config = TranscriptionConfig {
            model: model.display().to_string(),
            ..Default::default()
        };
        assert_eq!(resolve_model_path(&config).unwrap(), model);
    }

    #[test]
    fn int8_prefers_quantized_variant() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ggml-small-q8_0.bin"));
        touch(&dir.path().join("ggml-small.bin"));

        let config = TranscriptionConfig {
            model: "small".to_string(),
            models_dir: dir.path().to_path_buf(),
            compute_type: ComputePrecision::Int8,
            ..Default::default()
        };
        assert_eq!(
            resolve_model_path(&config).unwrap(),
            dir.path().join("ggml-small-q8_0.bin")
        );
    }

    #[test]
    fn int8_falls_back_to_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ggml-small.bin"));

        let config = TranscriptionConfig {
            model: "small".to_string(),
            models_dir: dir.path().to_path_buf(),
            compute_type: ComputePrecision::Int8,
            ..Default::default()
        };
        assert_eq!(
            resolve_model_path(&config).unwrap(),
            dir.path().join("ggml-small.bin")
        );
    }

    #[test]
    fn float16_ignores_quantized_variant() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ggml-small-q8_0.bin"));
        touch(&dir.path().join("ggml-small.bin"));

        let config = TranscriptionConfig {
            model: "small".to_string(),
            models_dir: dir.path().to_path_buf(),
            compute_type: ComputePrecision::Float16,
            ..Default::default()
        };
        assert_eq!(
            resolve_model_path(&config).unwrap(),
            dir.path().join("ggml-small.bin")
        );
    }

    #[test]
    fn missing_model_error_names_all_candidates() {
        let config = TranscriptionConfig {
            model: "small".to_string(),
            models_dir: PathBuf::from("/nonexistent-models"),
            compute_type: ComputePrecision::Int8,
            ..Default::default()
        };
        let err = resolve_model_path(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ggml-small-q8_0.bin"));
        assert!(message.contains("ggml-small.bin"));
    }
}
