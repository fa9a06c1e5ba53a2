//! Mel filterbank and onset strength envelope
//!
//! Mel scale is the Slaney variant (linear below 1 kHz, logarithmic above)
//! with area-normalised triangular filters.

use super::spectrum::PowerSpectrogram;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

/// Floor applied before taking logarithms of power
const AMIN: f64 = 1e-10;
/// Dynamic range kept below the loudest bin
const TOP_DB: f64 = 80.0;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// One triangular filter, stored as its non-zero span
#[derive(Debug, Clone)]
struct MelFilter {
    first_bin: usize,
    weights: Vec<f64>,
}

/// Triangular mel filters spanning 0 Hz to Nyquist
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let sr = sample_rate as f64;
        let n_bins = n_fft / 2 + 1;
        let fft_freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * sr / n_fft as f64).collect();

        let mel_max = hz_to_mel(sr / 2.0);
        let mel_points: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, centre, hi) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
                let enorm = 2.0 / (hi - lo);

                let dense: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - lo) / (centre - lo);
                        let upper = (hi - f) / (hi - centre);
                        lower.min(upper).max(0.0) * enorm
                    })
                    .collect();

                let first_bin = dense.iter().position(|&w| w > 0.0).unwrap_or(0);
                let last_bin = dense.iter().rposition(|&w| w > 0.0).unwrap_or(0);
                let weights = if dense[first_bin] > 0.0 {
                    dense[first_bin..=last_bin].to_vec()
                } else {
                    Vec::new()
                };

                MelFilter { first_bin, weights }
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Project every power frame onto the mel bands
    pub fn apply(&self, spectrogram: &PowerSpectrogram) -> Vec<Vec<f64>> {
        spectrogram
            .frames()
            .iter()
            .map(|frame| {
                self.filters
                    .iter()
                    .map(|filter| {
                        filter
                            .weights
                            .iter()
                            .zip(&frame[filter.first_bin..])
                            .map(|(w, p)| w * p)
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }
}

/// Convert power to decibels relative to 1.0, clipped `TOP_DB` below the peak
pub fn power_to_db(power: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut db: Vec<Vec<f64>> = power
        .iter()
        .map(|frame| frame.iter().map(|&p| 10.0 * p.max(AMIN).log10()).collect())
        .collect();

    let peak = db
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = peak - TOP_DB;

    for value in db.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = value.max(floor);
    }
    db
}

/// How per-band increases are combined into one value per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Median,
}

/// Onset strength: positive first difference of log-mel frames, combined across bands
///
/// The envelope has one value per spectrogram frame. It is left-padded with
/// `1 + n_fft / (2 * hop)` zeros so each value lines up with the centre of the
/// frame it describes.
pub fn onset_envelope(mel_db: &[Vec<f64>], n_fft: usize, hop: usize, aggregate: Aggregate) -> Vec<f64> {
    let n_frames = mel_db.len();
    let pad = 1 + n_fft / (2 * hop);

    let mut envelope = vec![0.0; pad.min(n_frames)];
    let mut rises: Vec<f64> = Vec::new();

    for pair in mel_db.windows(2) {
        if envelope.len() >= n_frames {
            break;
        }
        rises.clear();
        rises.extend(pair[1].iter().zip(&pair[0]).map(|(cur, prev)| (cur - prev).max(0.0)));
        envelope.push(combine(&mut rises, aggregate));
    }

    envelope
}

fn combine(values: &mut [f64], aggregate: Aggregate) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match aggregate {
        Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Aggregate::Median => {
            values.sort_by(|a, b| a.total_cmp(b));
            let mid = values.len() / 2;
            if values.len() % 2 == 1 {
                values[mid]
            } else {
                (values[mid - 1] + values[mid]) / 2.0
            }
        }
    }
}
