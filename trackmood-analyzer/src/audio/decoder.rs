//! Audio file decoding
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, WAV, OGG, ...)
//! and rubato for sample rate conversion.
//!
//! **Algorithm:**
//! 1. Probe the container (extension used as a hint)
//! 2. Pick the first track with a known codec
//! 3. Decode packets, averaging channels down to mono, until the duration cap
//!    is reached
//! 4. Resample to the analysis rate when the source rate differs

use super::AudioSample;
use crate::error::DecodeError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode the first `max_seconds` of `path` into a mono sample at `target_rate`
///
/// # Errors
/// * File I/O errors
/// * Unsupported or corrupt container
/// * Empty audio
pub fn decode_audio_file(
    path: &Path,
    max_seconds: u32,
    target_rate: u32,
) -> Result<AudioSample, DecodeError> {
    tracing::debug!(path = %path.display(), max_seconds, target_rate, "Decoding audio file");

    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Probe {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let source_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::UnknownSampleRate(path.to_path_buf()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let max_frames = source_rate as usize * max_seconds as usize;
    let mut mono: Vec<f32> = Vec::with_capacity(max_frames);

    while mono.len() < max_frames {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            // Track list changed mid-stream; what we have so far is enough
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(DecodeError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(path = %path.display(), reason, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(DecodeError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        mono.extend(
            buffer
                .samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    mono.truncate(max_frames);

    if mono.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    let signal = if source_rate == target_rate {
        mono
    } else {
        resample(mono, source_rate, target_rate)?
    };

    let sample = AudioSample::new(signal, target_rate);

    tracing::debug!(
        path = %path.display(),
        source_rate,
        total_samples = sample.signal().len(),
        duration_seconds = format!("{:.2}", sample.duration_seconds()),
        "Audio decoding complete"
    );

    if sample.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    Ok(sample)
}

/// Input frames fed to the resampler per call
const RESAMPLE_CHUNK: usize = 1024;

/// Convert a whole mono buffer between sample rates
///
/// The input is fed in fixed chunks, the filter tail is flushed with silence,
/// and the resampler's delay is cut from the front, so output sample `n` lines
/// up with input time `n / to` and the length is `round(len * to / from)`.
fn resample(samples: Vec<f32>, from: u32, to: u32) -> Result<Vec<f32>, DecodeError> {
    let fail = |reason: String| DecodeError::Resample { from, to, reason };
    let ratio = to as f64 / from as f64;

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| fail(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(delay + expected + RESAMPLE_CHUNK);

    let mut chunks = samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in chunks.by_ref() {
        let waves = resampler
            .process(&[chunk], None)
            .map_err(|e| fail(e.to_string()))?;
        append_channel(&mut output, waves).ok_or_else(|| fail(NO_CHANNELS.to_string()))?;
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let waves = resampler
            .process_partial(Some(&[rest][..]), None)
            .map_err(|e| fail(e.to_string()))?;
        append_channel(&mut output, waves).ok_or_else(|| fail(NO_CHANNELS.to_string()))?;
    }

    // Samples still inside the filter only come out behind silence
    while output.len() < delay + expected {
        let waves = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| fail(e.to_string()))?;
        let produced = append_channel(&mut output, waves)
            .ok_or_else(|| fail(NO_CHANNELS.to_string()))?;
        if produced == 0 {
            break;
        }
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}

const NO_CHANNELS: &str = "resampler produced no channels";

/// Append the single channel of `waves` to `output`, returning how many frames it held
fn append_channel(output: &mut Vec<f32>, waves: Vec<Vec<f32>>) -> Option<usize> {
    let channel = waves.into_iter().next()?;
    output.extend_from_slice(&channel);
    Some(channel.len())
}
