//! Framing, short-time power spectra and frame RMS
//!
//! Frames are centred: `n_fft / 2` zeros are added on both ends of the signal
//! so frame `t` is centred on sample `t * hop`.

use apodize::hanning_iter;
use rustfft::{num_complex::Complex, FftPlanner};

/// Power spectrogram, one row of `n_fft / 2 + 1` bins per frame
#[derive(Debug, Clone)]
pub struct PowerSpectrogram {
    frames: Vec<Vec<f64>>,
    n_bins: usize,
}

impl PowerSpectrogram {
    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }
}

/// Periodic Hann window (the symmetric window of length n + 1 minus its last point)
pub fn periodic_hann(len: usize) -> Vec<f64> {
    hanning_iter(len + 1).take(len).collect()
}

/// Zero-pad `frame_len / 2` samples on both sides
fn centre_pad(signal: &[f32], frame_len: usize) -> Vec<f64> {
    let pad = frame_len / 2;
    let mut padded = vec![0.0; signal.len() + 2 * pad];
    for (dst, &src) in padded[pad..].iter_mut().zip(signal) {
        *dst = src as f64;
    }
    padded
}

/// Number of centred frames for a signal of `len` samples
pub fn frame_count(len: usize, frame_len: usize, hop: usize) -> usize {
    let padded = len + 2 * (frame_len / 2);
    if padded < frame_len {
        return 0;
    }
    1 + (padded - frame_len) / hop
}

/// |STFT|² with a periodic Hann window
pub fn power_spectrogram(signal: &[f32], n_fft: usize, hop: usize) -> PowerSpectrogram {
    let padded = centre_pad(signal, n_fft);
    let n_frames = frame_count(signal.len(), n_fft, hop);
    let n_bins = n_fft / 2 + 1;
    let window = periodic_hann(n_fft);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    let mut frames = Vec::with_capacity(n_frames);
    for t in 0..n_frames {
        let start = t * hop;
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(padded[start + i] * window[i], 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);
        frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
    }

    PowerSpectrogram { frames, n_bins }
}

/// Root-mean-square amplitude of each centred time-domain frame
pub fn frame_rms(signal: &[f32], frame_len: usize, hop: usize) -> Vec<f64> {
    let padded = centre_pad(signal, frame_len);
    let n_frames = frame_count(signal.len(), frame_len, hop);

    (0..n_frames)
        .map(|t| {
            let frame = &padded[t * hop..t * hop + frame_len];
            let mean_square = frame.iter().map(|&s| s * s).sum::<f64>() / frame_len as f64;
            mean_square.sqrt()
        })
        .collect()
}
