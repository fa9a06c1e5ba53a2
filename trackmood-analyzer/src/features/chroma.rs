//! Pitch-class (chroma) projection of power spectra
//!
//! Each FFT bin contributes to the 12 pitch classes through a Gaussian bump
//! around its fractional pitch class. Bins are L2-normalised across classes,
//! weighted towards octave 5 with an octave width of 2, and rotated so class 0
//! is C. Tuning is fixed at A440.

use super::spectrum::PowerSpectrogram;
use crate::error::AnalysisError;

pub const N_CHROMA: usize = 12;

const CENTRE_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;
/// A0 at A440 tuning; octave numbers are measured from here
const A0_HZ: f64 = 440.0 / 16.0;

/// Pitch-class weights for every FFT bin up to Nyquist
#[derive(Debug, Clone)]
pub struct ChromaFilterbank {
    /// `weights[c][k]`: contribution of bin `k` to pitch class `c`
    weights: Vec<Vec<f64>>,
}

impl ChromaFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize) -> Self {
        let sr = sample_rate as f64;
        let n_chroma = N_CHROMA as f64;

        // Fractional pitch class of every bin; bin 0 (DC) is placed 1.5 octaves below bin 1
        let mut freq_bins: Vec<f64> = Vec::with_capacity(n_fft);
        for k in 1..n_fft {
            let hz = k as f64 * sr / n_fft as f64;
            freq_bins.push(n_chroma * (hz / A0_HZ).log2());
        }
        freq_bins.insert(0, freq_bins[0] - 1.5 * n_chroma);

        let mut bin_widths: Vec<f64> = freq_bins
            .windows(2)
            .map(|w| (w[1] - w[0]).max(1.0))
            .collect();
        bin_widths.push(1.0);

        let half = (n_chroma / 2.0).round();
        let mut weights = vec![vec![0.0; n_fft]; N_CHROMA];
        for k in 0..n_fft {
            for (c, row) in weights.iter_mut().enumerate() {
                let d = (freq_bins[k] - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
                row[k] = (-0.5 * (2.0 * d / bin_widths[k]).powi(2)).exp();
            }

            let norm = weights.iter().map(|row| row[k] * row[k]).sum::<f64>().sqrt();
            let octave = freq_bins[k] / n_chroma;
            let octave_weight = (-0.5 * ((octave - CENTRE_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
            for row in weights.iter_mut() {
                if norm > f64::MIN_POSITIVE {
                    row[k] /= norm;
                }
                row[k] *= octave_weight;
            }
        }

        // Classes above are measured from A; start at C instead
        weights.rotate_left(3);

        let n_bins = n_fft / 2 + 1;
        for row in weights.iter_mut() {
            row.truncate(n_bins);
        }

        Self { weights }
    }

    /// Chroma frames, each scaled so its largest class is 1.0
    pub fn apply(&self, spectrogram: &PowerSpectrogram) -> Vec<[f64; N_CHROMA]> {
        spectrogram
            .frames()
            .iter()
            .map(|frame| {
                let mut chroma = [0.0; N_CHROMA];
                for (value, row) in chroma.iter_mut().zip(&self.weights) {
                    *value = row.iter().zip(frame).map(|(w, p)| w * p).sum();
                }

                let peak = chroma.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
                if peak > f64::MIN_POSITIVE {
                    for value in chroma.iter_mut() {
                        *value /= peak;
                    }
                }
                chroma
            })
            .collect()
    }
}

/// Sum each pitch class over all frames
pub fn class_totals(chroma: &[[f64; N_CHROMA]]) -> [f64; N_CHROMA] {
    let mut totals = [0.0; N_CHROMA];
    for frame in chroma {
        for (total, value) in totals.iter_mut().zip(frame) {
            *total += value;
        }
    }
    totals
}

/// Share of chroma energy in C, E and G (root, major third, fifth of C major)
///
/// Fails when the totals sum to zero, which happens for silent input.
pub fn major_weight(totals: &[f64; N_CHROMA]) -> Result<f64, AnalysisError> {
    let sum: f64 = totals.iter().sum();
    if !sum.is_finite() {
        return Err(AnalysisError::NonFinite("chroma totals"));
    }
    if sum <= 0.0 {
        return Err(AnalysisError::SilentChroma);
    }
    Ok((totals[0] + totals[4] + totals[7]) / sum)
}
