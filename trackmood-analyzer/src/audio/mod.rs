//! Decoded audio samples and the decoding capability

mod decoder;

pub use decoder::decode_audio_file;

/// Only the first 30 seconds of any source are ever analysed
pub const MAX_CLIP_SECONDS: u32 = 30;

/// Mono audio at a fixed sample rate
///
/// `signal.len()` never exceeds `sample_rate * MAX_CLIP_SECONDS`; longer
/// input is truncated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    signal: Vec<f32>,
    sample_rate: u32,
}

impl AudioSample {
    /// Wrap mono samples, keeping at most the first 30 seconds
    pub fn new(mut signal: Vec<f32>, sample_rate: u32) -> Self {
        signal.truncate(max_samples(sample_rate));
        Self {
            signal,
            sample_rate,
        }
    }

    /// Mono amplitude values
    pub fn signal(&self) -> &[f32] {
        &self.signal
    }

    /// Samples per second
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Duration in seconds (0.0 for a zero sample rate)
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.signal.len() as f64 / self.sample_rate as f64
    }
}

fn max_samples(sample_rate: u32) -> usize {
    sample_rate as usize * MAX_CLIP_SECONDS as usize
}
