//! PCM extraction for Whisper
//!
//! The Whisper engine consumes **16 kHz mono `f32`** samples. This module
//! decodes WAV assets with `hound` and performs the two conversion steps:
//! channel downmix by averaging, and linear-interpolation resampling to
//! 16 kHz. Other containers are expected to arrive here as WAV via the
//! normalizer's ffmpeg pass.

use std::io::{Cursor, Read};

use crate::error::SpeechError;
use crate::types::{AudioAsset, AudioFormat, AudioSource};

/// Sample rate required by the Whisper engine
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Load an asset as 16 kHz mono `f32` samples
///
/// # Errors
///
/// Returns [`SpeechError::InvalidAudio`] when the asset is not a decodable
/// WAV file.
pub fn read_asset(asset: &AudioAsset) -> Result<Vec<f32>, SpeechError> {
    if let Some(format) = asset.format_hint() {
        if format != AudioFormat::Wav {
            return Err(SpeechError::InvalidAudio(format!(
                "unsupported container '{format}': only WAV is decoded directly, \
                 enable normalization to convert other formats"
            )));
        }
    }

    match asset.source() {
        AudioSource::File(path) => {
            let reader = hound::WavReader::open(path).map_err(|e| {
                SpeechError::InvalidAudio(format!("{}: {e}", path.display()))
            })?;
            decode(reader)
        }
        AudioSource::Memory(data) => {
            let reader = hound::WavReader::new(Cursor::new(data.as_slice()))
                .map_err(|e| SpeechError::InvalidAudio(e.to_string()))?;
            decode(reader)
        }
    }
}

/// Decode a WAV stream into 16 kHz mono `f32` samples
fn decode<R: Read>(mut reader: hound::WavReader<R>) -> Result<Vec<f32>, SpeechError> {
    let spec = reader.spec();
    let interleaved = read_samples(&mut reader, spec)?;
    let mono = downmix(&interleaved, spec.channels);
    Ok(resample(&mono, spec.sample_rate, WHISPER_SAMPLE_RATE))
}

/// Read all samples as normalized `f32` in `[-1.0, 1.0]`
fn read_samples<R: Read>(
    reader: &mut hound::WavReader<R>,
    spec: hound::WavSpec,
) -> Result<Vec<f32>, SpeechError> {
    let to_invalid = |e: hound::Error| SpeechError::InvalidAudio(e.to_string());

    match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(to_invalid))
            .collect(),
        hound::SampleFormat::Int => {
            // Scale by the full range of the source bit depth.
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale).map_err(to_invalid))
                .collect()
        }
    }
}

/// Mix interleaved multi-channel audio down to mono by averaging all
/// channels
///
/// The output length is `samples.len() / channels`. Mono input is returned
/// unchanged; zero channels yield an empty vector.
#[must_use]
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Resample `samples` from `source_rate` to `target_rate` using linear
/// interpolation
///
/// A matching source rate is a no-op copy.
#[must_use]
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn mono_16k_spec() -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    mod downmix {
        use super::*;

        #[test]
        fn mono_passes_through() {
            let input = vec![0.1_f32, 0.2, 0.3];
            assert_eq!(downmix(&input, 1), input);
        }

        #[test]
        fn stereo_averages_frames() {
            let input = vec![1.0_f32, -1.0, 0.5, 0.5];
            let out = downmix(&input, 2);
            assert_eq!(out.len(), 2);
            assert!((out[0] - 0.0).abs() < 1e-6);
            assert!((out[1] - 0.5).abs() < 1e-6);
        }

        #[test]
        fn zero_channels_yield_empty() {
            assert!(downmix(&[1.0_f32, 2.0], 0).is_empty());
        }
    }

    mod resample {
        use super::*;

        #[test]
        fn same_rate_is_noop() {
            let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
            assert_eq!(resample(&input, 16_000, 16_000), input);
        }

        #[test]
        fn empty_input_stays_empty() {
            assert!(resample(&[], 48_000, 16_000).is_empty());
        }

        #[test]
        fn downsample_48k_halves_thrice() {
            // 480 samples @ 48 kHz = 10 ms -> 160 samples @ 16 kHz
            let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
            assert_eq!(out.len(), 160);
        }

        #[test]
        fn upsample_8k_doubles() {
            let out = resample(&vec![0.0_f32; 80], 8_000, 16_000);
            assert_eq!(out.len(), 160);
        }

        #[test]
        fn constant_signal_preserves_amplitude() {
            let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
            for &s in &out {
                assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
            }
        }
    }

    mod read_asset {
        use crate::types::AudioFormat;

        use super::*;

        #[test]
        fn decodes_mono_16k_wav_from_memory() {
            let bytes = wav_bytes(mono_16k_spec(), &[0, 16_384, -16_384, 0]);
            let asset = AudioAsset::from_memory(bytes, AudioFormat::Wav);

            let samples = read_asset(&asset).unwrap();
            assert_eq!(samples.len(), 4);
            assert!((samples[1] - 0.5).abs() < 1e-3);
            assert!((samples[2] + 0.5).abs() < 1e-3);
        }

        #[test]
        fn downmixes_stereo_wav() {
            let spec = hound::WavSpec {
                channels: 2,
                ..mono_16k_spec()
            };
            let bytes = wav_bytes(spec, &[16_384, -16_384, 8_192, 8_192]);
            let asset = AudioAsset::from_memory(bytes, AudioFormat::Wav);

            let samples = read_asset(&asset).unwrap();
            assert_eq!(samples.len(), 2);
            assert!(samples[0].abs() < 1e-3);
            assert!((samples[1] - 0.25).abs() < 1e-3);
        }

        #[test]
        fn resamples_to_whisper_rate() {
            let spec = hound::WavSpec {
                sample_rate: 48_000,
                ..mono_16k_spec()
            };
            let bytes = wav_bytes(spec, &[0; 480]);
            let asset = AudioAsset::from_memory(bytes, AudioFormat::Wav);

            let samples = read_asset(&asset).unwrap();
            assert_eq!(samples.len(), 160);
        }

        #[test]
        fn rejects_non_wav_hint() {
            let asset = AudioAsset::from_memory(vec![0, 1, 2], AudioFormat::Mp3);
            let err = read_asset(&asset).unwrap_err();
            assert!(matches!(err, SpeechError::InvalidAudio(_)));
            assert!(err.to_string().contains("mp3"));
        }

        #[test]
        fn rejects_garbage_bytes() {
            let asset = AudioAsset::from_memory(vec![0xde, 0xad, 0xbe, 0xef], AudioFormat::Wav);
            assert!(matches!(
                read_asset(&asset),
                Err(SpeechError::InvalidAudio(_))
            ));
        }

        #[test]
        fn rejects_missing_file() {
            let asset = AudioAsset::from_file("/nonexistent/clip.wav");
            let err = read_asset(&asset).unwrap_err();
            assert!(err.to_string().contains("/nonexistent/clip.wav"));
        }
    }
}
