//! Speech - Audio conditioning and local Whisper transcription
//!
//! The synchronous half of the Voxpipe pipeline:
//! - `Normalizer` - loudness-normalize audio with ffmpeg, degrading to the
//!   original asset when the tool is missing or fails
//! - `Transcriber` - lazily load a GGML Whisper model and turn an audio
//!   asset into text
//! - `SpeechPipeline` - the canonical normalize-then-transcribe composition
//!
//! # Architecture
//!
//! Every operation blocks the calling thread for its full duration
//! (subprocess execution, model inference) and is safe to drive from a
//! worker pool. The loaded Whisper context is shared by reference; a fresh
//! decoding state is created per call, so no additional locking is needed
//! for concurrent transcriptions.
//!
//! # Example
//!
//! ```ignore
//! use speech::{AudioAsset, AudioConfig, SpeechPipeline, TranscriptionConfig};
//!
//! let pipeline = SpeechPipeline::new(&AudioConfig::default(), TranscriptionConfig::default());
//! let text = pipeline.transcribe(AudioAsset::from_file("clip.wav"))?;
//! ```

pub mod config;
pub mod error;
pub mod normalizer;
pub mod pcm;
pub mod pipeline;
pub mod transcriber;
pub mod types;

pub use config::{AudioConfig, ComputePrecision, Device, TranscriptionConfig};
pub use error::SpeechError;
pub use normalizer::Normalizer;
pub use pipeline::SpeechPipeline;
pub use transcriber::{RawTranscription, Segment, SttEngine, Transcriber};
pub use types::{AudioAsset, AudioFormat, AudioSource};
