//! Synthetic signals and WAV fixtures

use std::path::{Path, PathBuf};

/// Analysis rate used throughout the tests
pub const SAMPLE_RATE: u32 = 22_050;

/// Samples between clicks: 20 hops of 512, ~129.2 BPM at 22050 Hz
pub const CLICK_SPACING: usize = 10_240;

/// Full-scale sine
pub fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Short broadband bursts every `spacing` samples, silence in between
pub fn click_track(sample_rate: u32, seconds: f32, spacing: usize) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    let mut signal = vec![0.0f32; n];
    let mut start = spacing / 2;
    while start < n {
        for (k, slot) in signal[start..].iter_mut().take(32).enumerate() {
            *slot = 0.9 * (-(k as f32) / 4.0).exp();
        }
        start += spacing;
    }
    signal
}

/// Deterministic pseudo-random noise in [-amplitude, amplitude]
pub fn noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            amplitude * (2.0 * unit - 1.0)
        })
        .collect()
}

/// Write `channels` as a 16-bit PCM WAV (all channels must be the same length)
pub fn write_wav(path: &Path, sample_rate: u32, channels: &[Vec<f32>]) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = channels.first().map(Vec::len).unwrap_or(0);
    for i in 0..frames {
        for channel in channels {
            let value = (channel[i].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value)?;
        }
    }
    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Mono WAV of a 440 Hz tone at half scale
pub fn write_tone_wav(path: &Path, seconds: f32) -> anyhow::Result<PathBuf> {
    write_wav(path, SAMPLE_RATE, &[sine(440.0, SAMPLE_RATE, seconds, 0.5)])
}
