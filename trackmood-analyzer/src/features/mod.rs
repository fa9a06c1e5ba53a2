//! Feature extraction
//!
//! Maps one decoded [`AudioSample`] to a [`FeatureRecord`] in four stages:
//!
//! 1. **Tempo**: periodicity of the median-aggregated onset envelope
//! 2. **Energy**: mean frame RMS × 10, clamped above at 1.0
//! 3. **Danceability**: std-dev of the mean-aggregated onset envelope / 10,
//!    clamped to [0.0, 1.0]
//! 4. **Valence**: C-major triad share of the chromagram × 0.7 + energy × 0.3,
//!    not clamped
//!
//! The clamping differences between the three scores are calibration carried
//! over from earlier releases and are kept as they are.
//!
//! Extraction is all-or-nothing: any failure yields an [`AnalysisError`] and no
//! partial record. The functions here never touch the filesystem.

pub mod chroma;
pub mod mel;
pub mod spectrum;
pub mod tempo;

use crate::audio::AudioSample;
use crate::error::AnalysisError;
use chroma::{class_totals, ChromaFilterbank};
use mel::{onset_envelope, power_to_db, Aggregate, MelFilterbank};
use spectrum::{frame_rms, power_spectrogram};
use tracing::debug;
use trackmood_common::FeatureRecord;

pub use chroma::major_weight;
pub use tempo::estimate_tempo;

/// FFT size and analysis frame length
pub const N_FFT: usize = 2048;
/// Samples between successive frames
pub const HOP_LENGTH: usize = 512;
/// Mel bands used for onset detection
pub const N_MELS: usize = 128;

/// Empirical scale applied to mean RMS
const ENERGY_SCALE: f64 = 10.0;
/// Empirical divisor applied to the onset envelope deviation
const DANCEABILITY_DIVISOR: f64 = 10.0;
const MAJOR_WEIGHT_SHARE: f64 = 0.7;
const ENERGY_SHARE: f64 = 0.3;

/// Compute all four descriptors for `sample`
pub fn extract(sample: &AudioSample) -> Result<FeatureRecord, AnalysisError> {
    let signal = sample.signal();
    let sample_rate = sample.sample_rate();

    // A zero rate also empties the signal, so it is checked first
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }
    if signal.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    if signal.iter().any(|s| !s.is_finite()) {
        return Err(AnalysisError::NonFinite("signal"));
    }

    let power = power_spectrogram(signal, N_FFT, HOP_LENGTH);
    let mel_db = power_to_db(&MelFilterbank::new(sample_rate, N_FFT, N_MELS).apply(&power));

    let beat_envelope = onset_envelope(&mel_db, N_FFT, HOP_LENGTH, Aggregate::Median);
    let tempo = finite("tempo", estimate_tempo(&beat_envelope, sample_rate, HOP_LENGTH))?;

    let energy = finite("energy", energy_from_rms(&frame_rms(signal, N_FFT, HOP_LENGTH)))?;

    let onset_strength = onset_envelope(&mel_db, N_FFT, HOP_LENGTH, Aggregate::Mean);
    let danceability = finite("danceability", danceability_from_onsets(&onset_strength))?;

    let chroma = ChromaFilterbank::new(sample_rate, N_FFT).apply(&power);
    let weight = major_weight(&class_totals(&chroma))?;
    let valence = finite("valence", blend_valence(weight, energy))?;

    debug!(
        frames = power.n_frames(),
        tempo = format!("{:.1}", tempo),
        energy = format!("{:.3}", energy),
        danceability = format!("{:.3}", danceability),
        major_weight = format!("{:.3}", weight),
        valence = format!("{:.3}", valence),
        "Features extracted"
    );

    Ok(FeatureRecord {
        tempo,
        energy,
        danceability,
        valence,
    })
}

/// Mean of per-frame RMS values × 10, capped at 1.0
///
/// RMS is never negative so only the upper bound is applied.
pub fn energy_from_rms(rms: &[f64]) -> f64 {
    if rms.is_empty() {
        return 0.0;
    }
    let mean = rms.iter().sum::<f64>() / rms.len() as f64;
    (mean * ENERGY_SCALE).min(1.0)
}

/// Population standard deviation of the onset envelope / 10, clamped to [0, 1]
pub fn danceability_from_onsets(envelope: &[f64]) -> f64 {
    if envelope.is_empty() {
        return 0.0;
    }
    let n = envelope.len() as f64;
    let mean = envelope.iter().sum::<f64>() / n;
    let variance = envelope.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (variance.sqrt() / DANCEABILITY_DIVISOR).clamp(0.0, 1.0)
}

/// `major_weight * 0.7 + energy * 0.3`, deliberately left unclamped
pub fn blend_valence(major_weight: f64, energy: f64) -> f64 {
    major_weight * MAJOR_WEIGHT_SHARE + energy * ENERGY_SHARE
}

fn finite(stage: &'static str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::NonFinite(stage))
    }
}
