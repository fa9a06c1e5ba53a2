//! Tempo estimation from an onset strength envelope
//!
//! The envelope is cut into 8-second Hann-weighted windows (one per frame,
//! centred), each window is autocorrelated and scaled by its lag-0 value, and
//! the autocorrelations are averaged over time. Each lag then gets
//! `ln(1 + 1e6 * ac)` plus a log-normal prior around 120 BPM; the best lag
//! gives the tempo.

use super::spectrum::periodic_hann;
use rustfft::{num_complex::Complex, FftPlanner};

/// Length of the autocorrelation window in seconds
const AC_SECONDS: f64 = 8.0;
/// Centre of the tempo prior
const START_BPM: f64 = 120.0;
/// Width of the tempo prior in octaves
const STD_BPM: f64 = 1.0;
/// Faster tempi are never reported
const MAX_TEMPO: f64 = 320.0;

/// Estimate beats per minute from an onset envelope sampled at `sample_rate / hop`
///
/// Returns 0.0 when the envelope has no positive value.
pub fn estimate_tempo(envelope: &[f64], sample_rate: u32, hop: usize) -> f64 {
    if !envelope.iter().any(|&v| v > 0.0) {
        return 0.0;
    }

    let frame_rate = sample_rate as f64 / hop as f64;
    let win_length = ((AC_SECONDS * frame_rate).floor() as usize).max(2);

    let tempogram = mean_autocorrelation(envelope, win_length);

    let mut best: Option<(usize, f64)> = None;
    for (lag, &ac) in tempogram.iter().enumerate().skip(1) {
        let bpm = 60.0 * frame_rate / lag as f64;
        if bpm >= MAX_TEMPO {
            continue;
        }
        let prior = -0.5 * ((bpm.log2() - START_BPM.log2()) / STD_BPM).powi(2);
        let score = (1e6 * ac).ln_1p() + prior;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    best.map(|(lag, _)| 60.0 * frame_rate / lag as f64)
        .unwrap_or(0.0)
}

/// Average windowed autocorrelation, one value per lag in `0..win_length`
fn mean_autocorrelation(envelope: &[f64], win_length: usize) -> Vec<f64> {
    let padded = ramp_pad(envelope, win_length / 2);
    let window = periodic_hann(win_length);
    let n_windows = padded.len().saturating_sub(win_length) + 1;

    let fft_len = (2 * win_length - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);
    let mut buffer = vec![Complex::new(0.0, 0.0); fft_len];

    let mut sum = vec![0.0; win_length];
    for start in 0..n_windows {
        buffer.fill(Complex::new(0.0, 0.0));
        for (i, slot) in buffer.iter_mut().take(win_length).enumerate() {
            slot.re = padded.get(start + i).copied().unwrap_or(0.0) * window[i];
        }

        forward.process(&mut buffer);
        for value in buffer.iter_mut() {
            *value = Complex::new(value.norm_sqr(), 0.0);
        }
        inverse.process(&mut buffer);

        let peak = buffer[..win_length]
            .iter()
            .fold(0.0f64, |acc, c| acc.max(c.re.abs()));
        if peak > f64::MIN_POSITIVE {
            for (total, c) in sum.iter_mut().zip(&buffer[..win_length]) {
                *total += c.re / peak;
            }
        }
    }

    for total in sum.iter_mut() {
        *total /= n_windows as f64;
    }
    sum
}

/// Pad both ends with linear ramps from zero to the edge values
fn ramp_pad(envelope: &[f64], width: usize) -> Vec<f64> {
    let first = envelope.first().copied().unwrap_or(0.0);
    let last = envelope.last().copied().unwrap_or(0.0);
    let w = width as f64;

    let mut padded = Vec::with_capacity(envelope.len() + 2 * width);
    padded.extend((0..width).map(|i| first * i as f64 / w));
    padded.extend_from_slice(envelope);
    padded.extend((0..width).map(|i| last * (w - 1.0 - i as f64) / w));
    padded
}
